#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Typed, category-structured configuration.
//!
//! The host declares the values it cares about, each with a default that
//! fixes its type, then parses a file or string into them. Values live in
//! stable cells: a [`ValueHandle`] obtained once keeps observing the current
//! value across every later parse.
//!
//! # Language
//!
//! ```text
//! # comments run to the end of the line, ## is a literal #
//! $GAPS = 5                          # variables
//! general {
//!     border_size = {{$GAPS * 2}}    # inline arithmetic
//!     col.active = rgba(33ccffee)    # colors become packed ARGB ints
//!     layout = dwindle
//! }
//! general:gaps_out = $GAPS           # fully-qualified assignment
//!
//! monitor {                          # special category keyed by `name`
//!     name = DP-1
//!     scale = 1.5
//! }
//! monitor[HDMI-A-1]:scale = 2        # bracketed key
//!
//! long = first \
//!        second                      # line continuation
//!
//! #hyprlang if GAPS
//! #hyprlang noerror true
//! #hyprlang endif
//! ```
//!
//! Assignments that no registered value claims go to keyword handlers
//! (`bind = ...`, `source = ...`), see [`Config::register_handler`].
//!
//! # Example
//!
//! ```
//! use hyprlang::{Config, ConfigOptions, SpecialCategoryOptions};
//!
//! let mut config = Config::from_stream(
//! 	"$W = 2\nborder = {{$W * 3}}\nmonitor[DP-1] {\n  scale = 1.5\n}\n",
//! 	ConfigOptions::default(),
//! );
//! config.add_config_value("border", 0i64);
//! config.add_special_category("monitor", SpecialCategoryOptions::keyed("name"));
//! config.add_special_config_value("monitor", "scale", 1.0f32);
//! config.commence();
//!
//! let border = config.value_handle("border").unwrap();
//! config.parse().unwrap();
//!
//! assert_eq!(config.value(border).and_then(|v| v.as_int()), Some(6));
//! assert_eq!(config.get_special::<f32>("monitor", "scale", Some("DP-1")), Some(1.5));
//! assert_eq!(config.list_keys_for_special_category("monitor"), ["DP-1"]);
//! ```

mod arena;
mod config;
mod driver;
pub mod error;
mod grammar;
pub mod handler;
mod special;
pub mod value;
mod vars;

pub use arena::ValueHandle;
pub use config::{Config, ConfigOptions, ConfigSource};
pub use error::{Diagnostic, ExpressionError, GrammarError, HandlerError, LineError, Origin, ParseError, Result};
pub use grammar::MAX_REPLAYS;
pub use handler::{HandlerFn, HandlerOptions};
pub use special::SpecialCategoryOptions;
pub use value::{
	ConfigType, ConfigValue, CustomData, CustomDestroyFn, CustomParseFn, CustomType, CustomValue, DefaultValue, Value,
	ValueKind, Vec2,
};
