#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;

pub mod mock;
pub mod sse;

use std::sync::Arc;

use anyhow::Result;

use crate::configuration::Config;
use crate::domain::models::TransportArc;
use crate::domain::models::TransportName;

pub struct TransportManager {}

impl TransportManager {
    pub fn get(name: TransportName, config: &Config) -> Result<TransportArc> {
        if name == TransportName::Mock {
            return Ok(Arc::new(mock::Mock::new(config)?));
        }

        return Ok(Arc::new(sse::Sse::new(config)));
    }
}
