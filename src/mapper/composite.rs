// src/mapper/composite.rs

use super::{MappingError, NameMapper};

/// Union of the targets of several mappers, in mapper order, without
/// duplicates.
#[derive(Debug, Default)]
pub struct CompositeMapper {
    mappers: Vec<Box<dyn NameMapper>>,
}

impl CompositeMapper {
    pub fn new(mappers: Vec<Box<dyn NameMapper>>) -> Self {
        Self { mappers }
    }

    pub fn add(&mut self, mapper: Box<dyn NameMapper>) {
        self.mappers.push(mapper);
    }
}

impl NameMapper for CompositeMapper {
    fn map_file_name(&self, name: &str) -> Result<Option<Vec<String>>, MappingError> {
        let mut out: Vec<String> = Vec::new();
        for mapper in &self.mappers {
            for target in mapper.map_file_name(name)?.into_iter().flatten() {
                if !out.contains(&target) {
                    out.push(target);
                }
            }
        }
        Ok((!out.is_empty()).then_some(out))
    }
}

/// Feeds the output of each mapper into the next one.
#[derive(Debug, Default)]
pub struct ChainedMapper {
    stages: Vec<Box<dyn NameMapper>>,
}

impl ChainedMapper {
    pub fn new(stages: Vec<Box<dyn NameMapper>>) -> Self {
        Self { stages }
    }
}

impl NameMapper for ChainedMapper {
    fn map_file_name(&self, name: &str) -> Result<Option<Vec<String>>, MappingError> {
        if self.stages.is_empty() {
            return Ok(None);
        }
        let mut current = vec![name.to_string()];
        for stage in &self.stages {
            let mut next = Vec::new();
            for input in &current {
                next.extend(stage.map_file_name(input)?.into_iter().flatten());
            }
            if next.is_empty() {
                return Ok(None);
            }
            current = next;
        }
        Ok(Some(current))
    }
}
