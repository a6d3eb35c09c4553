// src/mapper/simple.rs

use super::{MappingError, NameMapper};

/// Every name maps onto itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityMapper;

impl NameMapper for IdentityMapper {
    fn map_file_name(&self, name: &str) -> Result<Option<Vec<String>>, MappingError> {
        Ok(Some(vec![name.to_string()]))
    }
}

/// Strips all leading directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlattenMapper;

impl NameMapper for FlattenMapper {
    fn map_file_name(&self, name: &str) -> Result<Option<Vec<String>>, MappingError> {
        let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
        Ok(Some(vec![base.to_string()]))
    }
}

/// Every name maps onto one fixed target.
#[derive(Debug, Clone)]
pub struct MergeMapper {
    to: String,
}

impl MergeMapper {
    pub fn new(to: impl Into<String>) -> Self {
        Self { to: to.into() }
    }
}

impl NameMapper for MergeMapper {
    fn map_file_name(&self, _name: &str) -> Result<Option<Vec<String>>, MappingError> {
        Ok(Some(vec![self.to.clone()]))
    }
}
