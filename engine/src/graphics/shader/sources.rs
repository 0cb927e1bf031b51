use std::path::Path;

use log::debug;

use crate::{ShaderError, graphics::lowlevel::ShaderStage};

/// Source text for each stage of a program. Empty slots are not part of the program.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ShaderSources {
    stages: [Option<String>; 5],
}

impl ShaderSources {
    /// Creates an empty source set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source for `stage`. An empty string clears the slot.
    pub fn set(&mut self, stage: ShaderStage, source: impl Into<String>) -> &mut Self {
        let source = source.into();
        self.stages[stage.index()] = (!source.is_empty()).then_some(source);
        self
    }

    /// Returns the source for `stage`, if the stage is part of the program.
    pub fn get(&self, stage: ShaderStage) -> Option<&str> {
        self.stages[stage.index()].as_deref()
    }

    pub fn vertex(mut self, source: impl Into<String>) -> Self {
        self.set(ShaderStage::Vertex, source);
        self
    }

    pub fn tess_control(mut self, source: impl Into<String>) -> Self {
        self.set(ShaderStage::TessControl, source);
        self
    }

    pub fn tess_evaluation(mut self, source: impl Into<String>) -> Self {
        self.set(ShaderStage::TessEvaluation, source);
        self
    }

    pub fn geometry(mut self, source: impl Into<String>) -> Self {
        self.set(ShaderStage::Geometry, source);
        self
    }

    pub fn fragment(mut self, source: impl Into<String>) -> Self {
        self.set(ShaderStage::Fragment, source);
        self
    }

    /// Iterates over the present stages in pipeline order.
    pub fn iter(&self) -> impl Iterator<Item = (ShaderStage, &str)> {
        ShaderStage::ALL
            .into_iter()
            .filter_map(|stage| self.get(stage).map(|source| (stage, source)))
    }

    /// Returns true if no stage has any source.
    pub fn is_empty(&self) -> bool {
        self.stages.iter().all(Option::is_none)
    }

    /// Loads `<dir>/<name>.<ext>` for every stage, using the extensions from
    /// [`ShaderStage::extension`]. Missing files are skipped.
    pub fn load(dir: impl AsRef<Path>, name: &str) -> Result<Self, ShaderError> {
        let mut sources = Self::new();

        for stage in ShaderStage::ALL {
            let path = dir
                .as_ref()
                .join(format!("{name}.{}", stage.extension()));
            if !path.is_file() {
                continue;
            }
            let text = std::fs::read_to_string(&path)
                .map_err(|error| ShaderError::Io { path: path.clone(), error })?;
            debug!("Loaded {:?} stage from {:?}", stage, path);
            sources.set(stage, text);
        }

        Ok(sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_strings_are_absent() {
        let sources = ShaderSources::new().vertex("void main() {}").fragment("");
        assert_eq!(sources.get(ShaderStage::Fragment), None);
        assert_eq!(sources.iter().count(), 1);
    }

    #[test]
    fn iterates_in_pipeline_order() {
        let sources = ShaderSources::new()
            .fragment("f")
            .geometry("g")
            .vertex("v");
        let stages: Vec<ShaderStage> = sources.iter().map(|(stage, _)| stage).collect();
        assert_eq!(
            stages,
            vec![ShaderStage::Vertex, ShaderStage::Geometry, ShaderStage::Fragment]
        );
    }

    #[test]
    fn loads_stage_files_from_a_directory() {
        let dir = std::env::temp_dir().join(format!("shadercraft-sources-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("basic.vert"), "void main() {}").unwrap();
        std::fs::write(dir.join("basic.frag"), "out vec4 color;\nvoid main() {}").unwrap();

        let sources = ShaderSources::load(&dir, "basic").unwrap();
        std::fs::remove_dir_all(&dir).unwrap();

        assert_eq!(sources.get(ShaderStage::Vertex), Some("void main() {}"));
        assert!(sources.get(ShaderStage::Geometry).is_none());
        assert!(sources.get(ShaderStage::Fragment).unwrap().contains("out vec4"));
    }

    #[test]
    fn missing_directory_is_an_empty_set() {
        let sources = ShaderSources::load("/nonexistent/shadercraft", "basic").unwrap();
        assert!(sources.is_empty());
    }
}
