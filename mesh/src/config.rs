//! Mesh sizing.

use std::env;

use crate::Error;

const WORLD_SIZE_VAR: &str = "MESH_WORLD_SIZE";
const CHANNEL_CAPACITY_VAR: &str = "MESH_CHANNEL_CAPACITY";

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Shape of an in-process mesh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeshConfig {
    /// Number of ranks.
    pub world_size: usize,
    /// Messages a link buffers before a blocking send has to wait.
    pub channel_capacity: usize,
}

impl MeshConfig {
    /// Reads `MESH_WORLD_SIZE` and `MESH_CHANNEL_CAPACITY`, falling back to
    /// the defaults for unset variables.
    pub fn from_env() -> Result<Self, Error> {
        let config = Self::default().with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Applies whichever `MESH_*` variables are set, without validating, so
    /// callers can layer further overrides before calling [`validate`].
    ///
    /// [`validate`]: MeshConfig::validate
    pub fn with_env(mut self) -> Result<Self, Error> {
        if let Some(world_size) = read_var(WORLD_SIZE_VAR)? {
            self.world_size = world_size;
        }
        if let Some(capacity) = read_var(CHANNEL_CAPACITY_VAR)? {
            self.channel_capacity = capacity;
        }
        Ok(self)
    }

    pub fn with_world_size(mut self, world_size: usize) -> Self {
        self.world_size = world_size;
        self
    }

    pub fn with_channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.world_size == 0 {
            return Err(Error::InvalidConfig("world size must be at least 1".into()));
        }
        if self.channel_capacity == 0 {
            return Err(Error::InvalidConfig(
                "channel capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            world_size: 1,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

fn read_var(name: &str) -> Result<Option<usize>, Error> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::InvalidConfig(format!("{}={:?}: {}", name, value, e))),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(Error::InvalidConfig(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_single_rank() {
        let config = MeshConfig::default();
        assert_eq!(config.world_size, 1);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_empty_world() {
        let config = MeshConfig::default().with_world_size(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_capacity() {
        let config = MeshConfig::default().with_channel_capacity(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }
}
