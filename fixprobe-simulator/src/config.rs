/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Simulator behaviour switches.

use serde::{Deserialize, Serialize};

/// Text carried by reports for orders refused in reject mode.
pub const DEFAULT_REJECT_TEXT: &str = "simulated reject";

/// How the simulator answers new orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// Follow every New acknowledgment with a full fill at the order price.
    pub auto_fill: bool,
    /// Refuse every NewOrderSingle with a Rejected report.
    pub reject_new_orders: bool,
    /// Text (58) of reports sent in reject mode.
    pub reject_text: String,
}

impl SimulatorConfig {
    /// Creates a configuration that acknowledges orders and never fills them.
    #[must_use]
    pub fn new() -> Self {
        Self {
            auto_fill: false,
            reject_new_orders: false,
            reject_text: DEFAULT_REJECT_TEXT.to_string(),
        }
    }

    /// Enables or disables the automatic fill after each acknowledgment.
    #[must_use]
    pub const fn with_auto_fill(mut self, auto_fill: bool) -> Self {
        self.auto_fill = auto_fill;
        self
    }

    /// Enables or disables reject mode.
    #[must_use]
    pub const fn with_reject_new_orders(mut self, reject: bool) -> Self {
        self.reject_new_orders = reject;
        self
    }

    /// Sets the text of reject-mode reports.
    #[must_use]
    pub fn with_reject_text(mut self, text: impl Into<String>) -> Self {
        self.reject_text = text.into();
        self
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SimulatorConfig::default();
        assert!(!config.auto_fill);
        assert!(!config.reject_new_orders);
        assert_eq!(config.reject_text, DEFAULT_REJECT_TEXT);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SimulatorConfig = serde_json::from_str(r#"{"auto_fill": true}"#).unwrap();
        assert!(config.auto_fill);
        assert!(!config.reject_new_orders);
        assert_eq!(config.reject_text, DEFAULT_REJECT_TEXT);
    }
}
