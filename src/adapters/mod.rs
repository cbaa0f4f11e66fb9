//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                   | Connects to              |
//! |------------|------------------------------|--------------------------|
//! | `log_sink` | EventSink                    | `log` facade             |
//! | `storage`  | StoragePort                  | in-memory store          |
//! |            | SessionStore, ConfigPort     | any StoragePort backend  |
//! | `sim`      | every printer port, InputPin | host simulation          |

pub mod log_sink;
pub mod sim;
pub mod storage;
