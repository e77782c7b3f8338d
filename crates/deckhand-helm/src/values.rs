//! Values file ordering
//!
//! Helm applies `--values` flags left to right, later files overriding
//! earlier ones. Files shipped inside the chart always go first and external
//! files last, so external values win regardless of how the caller listed them.

use deckhand_core::{Container, File};

/// Directory external values files are staged in, outside the chart mount
/// and apart from the rendered output
pub const STAGING_DIR: &str = "/tmp/values";

#[derive(Debug, Clone, Default)]
pub struct ValuesSource {
    in_chart: Vec<String>,
    external: Vec<File>,
}

impl ValuesSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add values files by name, relative to the chart directory
    #[must_use]
    pub fn in_chart<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.in_chart.extend(names.into_iter().map(Into::into));
        self
    }

    /// Add values files supplied from outside the chart
    #[must_use]
    pub fn external<I>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = File>,
    {
        self.external.extend(files);
        self
    }

    pub fn in_chart_files(&self) -> &[String] {
        &self.in_chart
    }

    pub fn external_files(&self) -> &[File] {
        &self.external
    }

    pub fn is_empty(&self) -> bool {
        self.in_chart.is_empty() && self.external.is_empty()
    }

    /// Container path external file `index` (0-based) is staged at
    pub fn staged_path(index: usize) -> String {
        format!("{}/values-{}.yaml", STAGING_DIR, index + 1)
    }

    /// Stage external files into the container and return the `--values` flags
    ///
    /// In-chart flags come first, in input order, then one flag per staged
    /// external file, in input order.
    pub fn apply(&self, mut container: Container) -> (Container, Vec<String>) {
        let mut flags = to_flags("--values", &self.in_chart);

        for (idx, file) in self.external.iter().enumerate() {
            let path = Self::staged_path(idx);
            container = container.with_file(path.clone(), file.clone());
            flags.push("--values".to_string());
            flags.push(path);
        }

        (container, flags)
    }
}

/// Repeat `flag` before each value
pub fn to_flags<S: AsRef<str>>(flag: &str, values: &[S]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| [flag.to_string(), v.as_ref().to_string()])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckhand_core::MountSource;

    #[test]
    fn test_to_flags() {
        assert_eq!(
            to_flags("--values", &["a.yaml", "b.yaml"]),
            ["--values", "a.yaml", "--values", "b.yaml"]
        );
        assert!(to_flags::<&str>("--values", &[]).is_empty());
    }

    #[test]
    fn test_external_after_in_chart() {
        // Declared external-first: ordering must still put in-chart first.
        let source = ValuesSource::new()
            .external([File::new("prod.yaml", "a: 1"), File::new("values.yaml", "b: 2")])
            .in_chart(["values.yaml", "values-ci.yaml"]);

        let (ctr, flags) = source.apply(Container::from("img"));

        assert_eq!(
            flags,
            [
                "--values",
                "values.yaml",
                "--values",
                "values-ci.yaml",
                "--values",
                "/tmp/values/values-1.yaml",
                "--values",
                "/tmp/values/values-2.yaml",
            ]
        );
        assert_eq!(ctr.mounts().len(), 2);
    }

    #[test]
    fn test_colliding_names_staged_apart() {
        let source = ValuesSource::new().external([
            File::new("values.yaml", "first: true"),
            File::new("values.yaml", "second: true"),
            File::new("values.yaml", "third: true"),
        ]);

        let (ctr, _) = source.apply(Container::from("img"));
        let paths: Vec<&str> = ctr.mounts().iter().map(|m| m.path.as_str()).collect();
        assert_eq!(
            paths,
            ["/tmp/values/values-1.yaml", "/tmp/values/values-2.yaml", "/tmp/values/values-3.yaml"]
        );

        match &ctr.mount_at("/tmp/values/values-2.yaml").unwrap().source {
            MountSource::File(f) => assert_eq!(f.contents_str(), "second: true"),
            other => panic!("unexpected mount: {:?}", other),
        }
    }

    #[test]
    fn test_empty_source() {
        let source = ValuesSource::new();
        assert!(source.is_empty());

        let (ctr, flags) = source.apply(Container::from("img"));
        assert!(flags.is_empty());
        assert!(ctr.mounts().is_empty());
    }
}
