//! Built-in queryer implementations.

pub mod random;

use crate::queryer::Queryer;
use crate::registry::QueryerFactory;
use random::RandomFeatureQueryer;
use std::sync::Arc;

/// Registers every built-in implementation under its table-file name.
pub fn register_builtin(factory: &mut QueryerFactory) {
    factory.register(RandomFeatureQueryer::IMPLEMENTATION, |config| {
        let queryer: Arc<dyn Queryer> = Arc::new(RandomFeatureQueryer::from_config(config)?);
        Ok(queryer)
    });
}
