// Service providers group related bindings

use super::Container;
use crate::Error;

/// A unit of container configuration.
///
/// `register` should only bind; `boot` runs after every provider in a batch
/// has registered and may resolve what others bound.
pub trait ServiceProvider: Send + Sync {
    fn register(&self, container: &Container) -> Result<(), Error>;

    fn boot(&self, _container: &Container) -> Result<(), Error> {
        Ok(())
    }

    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
