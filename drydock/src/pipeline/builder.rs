//! Pipeline construction and validation.

use super::Pipeline;
use crate::errors::ConfigError;
use crate::stages::Stage;
use std::collections::HashSet;
use std::sync::Arc;

/// Builds a [`Pipeline`], validating the stage sequence.
///
/// All validation happens in [`build`]; a pipeline that constructs
/// successfully can always be run.
///
/// [`build`]: PipelineBuilder::build
#[derive(Debug)]
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
}

impl PipelineBuilder {
    /// Creates a builder for a pipeline with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    /// Appends one stage.
    #[must_use]
    pub fn add_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Appends an already shared stage.
    #[must_use]
    pub fn add_shared(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends an ordered sequence of stages.
    ///
    /// Insertion order is execution order.
    #[must_use]
    pub fn register<I>(mut self, stages: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Stage>>,
    {
        self.stages.extend(stages);
        self
    }

    /// Validates the stage sequence and builds the pipeline.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the sequence is empty, a stage
    /// name is blank, or two stages share a name.
    pub fn build(self) -> Result<Pipeline, ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::empty());
        }

        let mut seen = HashSet::new();
        for (index, stage) in self.stages.iter().enumerate() {
            let name = stage.name();
            if name.trim().is_empty() {
                return Err(ConfigError::blank_name(index + 1));
            }
            if !seen.insert(name.to_string()) {
                return Err(ConfigError::duplicate_stage(name));
            }
        }

        Ok(Pipeline::from_parts(self.name, self.stages))
    }
}
