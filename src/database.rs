//! Database Module
//!
//! The process-level registry of named schemas and named collections, and
//! the dispatcher that applies protocol commands to them.
//!
//! ## Responsibilities
//! - Own every schema and collection by name
//! - Resolve commands to engine calls
//! - Translate engine outcomes into protocol responses
//!
//! The engine itself never produces a response message; everything
//! user-visible (success / not-found / invalid-command) is decided here.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::collection::Collection;
use crate::protocol::{Command, Response};
use crate::schema::{FieldType, Schema, STRING_HEADER_SIZE};

/// Named schema and collection registries
#[derive(Default)]
pub struct Database {
    schemas: HashMap<String, Schema>,
    collections: HashMap<String, Collection>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema under `name`, replacing any previous one
    pub fn register_schema(&mut self, name: impl Into<String>, schema: Schema) -> &Schema {
        let name = name.into();
        tracing::debug!("Registering schema '{}'", name);

        match self.schemas.entry(name) {
            Entry::Occupied(mut e) => {
                e.insert(schema);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(schema),
        }
    }

    /// Create a collection bound to a copy of `schema`, replacing any
    /// previous collection of the same name
    pub fn create_collection(&mut self, name: impl Into<String>, schema: Schema) -> &mut Collection {
        let name = name.into();
        tracing::debug!("Creating collection '{}'", name);

        match self.collections.entry(name) {
            Entry::Occupied(mut e) => {
                e.insert(Collection::new(schema));
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(Collection::new(schema)),
        }
    }

    /// Look up a registered schema
    pub fn schema(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Look up a collection
    pub fn collection(&mut self, name: &str) -> Option<&mut Collection> {
        self.collections.get_mut(name)
    }

    /// Apply a command and produce the response for the client
    pub fn execute(&mut self, command: Command) -> Response {
        match command {
            Command::RegisterSchema { name, schema } => {
                self.register_schema(name, schema);
                Response::Success
            }

            Command::CreateCollection { name, schema_name } => {
                let Some(schema) = self.schemas.get(&schema_name).cloned() else {
                    return Response::NotFound;
                };

                self.create_collection(name, schema);
                Response::Success
            }

            Command::GetSchema { name } => match self.schemas.get(&name) {
                Some(schema) => Response::Schema {
                    schema: schema.clone(),
                },
                None => Response::NotFound,
            },

            Command::GetCollectionSchema { name } => match self.collections.get(&name) {
                Some(coll) => Response::Schema {
                    schema: coll.schema().clone(),
                },
                None => Response::NotFound,
            },

            Command::Get { collection, key } => match self.collections.get(&collection) {
                Some(coll) => match coll.find(&key) {
                    Some(record) => Response::Found {
                        record: record.to_vec(),
                    },
                    None => Response::NotFound,
                },
                None => Response::NotFound,
            },

            Command::Put { collection, record } => {
                let Some(coll) = self.collections.get_mut(&collection) else {
                    return Response::NotFound;
                };

                // The engine trusts record buffers; the shape checks live here
                if record.len() != coll.doc_size() || !string_key_in_bounds(coll, &record) {
                    return Response::InvalidCommand;
                }

                match coll.put(&record) {
                    Ok(_) => Response::Success,
                    Err(e) => Response::error(e),
                }
            }

            Command::Delete { collection, key } => match self.collections.get_mut(&collection) {
                Some(coll) => {
                    coll.remove(&key);
                    Response::Success
                }
                None => Response::NotFound,
            },

            Command::Ping => Response::Pong,
        }
    }
}

/// For a string-keyed collection, check the record's key length header
/// against the declared capacity before the engine slices by it
fn string_key_in_bounds(coll: &Collection, record: &[u8]) -> bool {
    let schema = coll.schema();
    let key_field = schema.key_field();

    let FieldType::String { capacity } = key_field.ty else {
        return true;
    };

    let offset = schema.offset(schema.key_field_index() as usize);
    let header = &record[offset..offset + STRING_HEADER_SIZE];
    let len = u32::from_ne_bytes([header[0], header[1], header[2], header[3]]) as usize;

    len <= capacity
}
