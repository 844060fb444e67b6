//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Message Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Tag (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: REGISTER_SCHEMA       - name + serialized schema
//! - 0x02: CREATE_COLLECTION     - name + schema name
//! - 0x03: GET_SCHEMA            - name
//! - 0x04: GET_COLLECTION_SCHEMA - collection name
//! - 0x05: GET                   - collection name + key bytes
//! - 0x06: PUT                   - collection name + record bytes
//! - 0x07: DELETE                - collection name + key bytes
//! - 0x08: PING                  - empty
//!
//! ### Response Tags
//! - 0x00: SUCCESS
//! - 0x01: NOT_FOUND
//! - 0x02: INVALID_COMMAND
//! - 0x03: ERROR    - message bytes
//! - 0x04: FOUND    - record bytes
//! - 0x05: SCHEMA   - serialized schema
//! - 0x06: PONG
//!
//! All wire integers are big-endian; strings and byte spans are u32
//! length-prefixed. A serialized schema is a field count, then per field a
//! length-prefixed name, a one-byte type tag (in `FieldType` declaration
//! order), a u32 capacity for strings only, and a recursive field list for
//! aggregates only, followed by a u32 key-field index.

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, ResponseType};
pub use codec::{
    decode_command, decode_response, decode_schema, encode_command, encode_response,
    encode_schema, read_command, read_response, write_command, write_response,
};
