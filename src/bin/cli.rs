//! LatticeKV CLI Client
//!
//! Command-line interface for interacting with a LatticeKV server.
//!
//! Record payloads are passed and printed hex-encoded, since records are
//! raw schema-laid-out bytes. Keys are raw strings by default (the natural
//! fit for string-keyed collections) or hex with `--hex` for scalar keys.

use std::net::TcpStream;
use std::process::exit;

use clap::{Parser, Subcommand};

use latticekv::protocol::{read_response, write_command, Command, Response};
use latticekv::schema::{Field, FieldType, Schema};

/// LatticeKV CLI
#[derive(Parser, Debug)]
#[command(name = "latticekv-cli")]
#[command(about = "CLI for the LatticeKV structured key-value store")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7469")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Register a schema
    ///
    /// Fields are comma-separated `name:type` pairs; prefix one with `key:`
    /// to mark the key field (defaults to the first field). Types: bool,
    /// uint8, uint16, uint32, uint64, int8, int16, int32, int64, float32,
    /// float64, string<N>.
    ///
    /// Example: register-schema user 'key:id:uint64,name:string<32>,balance:int64'
    RegisterSchema {
        /// Schema name
        name: String,

        /// Field list
        fields: String,
    },

    /// Create a collection from a registered schema
    CreateCollection {
        /// Collection name
        name: String,

        /// Name of a previously registered schema
        schema: String,
    },

    /// Print a registered schema
    Schema {
        /// Schema name
        name: String,
    },

    /// Print the schema a collection was built from
    CollectionSchema {
        /// Collection name
        name: String,
    },

    /// Get a record by key
    Get {
        /// Collection name
        collection: String,

        /// The key to look up
        key: String,

        /// Interpret the key as hex bytes
        #[arg(long)]
        hex: bool,
    },

    /// Put a record (hex-encoded bytes, exactly doc_size long)
    Put {
        /// Collection name
        collection: String,

        /// Hex-encoded record bytes
        record: String,
    },

    /// Delete a record by key
    Del {
        /// Collection name
        collection: String,

        /// The key to delete
        key: String,

        /// Interpret the key as hex bytes
        #[arg(long)]
        hex: bool,
    },

    /// Ping the server
    Ping,
}

fn main() {
    let args = Args::parse();

    let command = match build_command(args.command) {
        Ok(cmd) => cmd,
        Err(msg) => {
            eprintln!("error: {msg}");
            exit(2);
        }
    };

    let mut stream = match TcpStream::connect(&args.server) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: failed to connect to {}: {}", args.server, e);
            exit(1);
        }
    };

    let response = write_command(&mut stream, &command)
        .and_then(|_| read_response(&mut stream));

    match response {
        Ok(response) => print_response(&response),
        Err(e) => {
            eprintln!("error: {e}");
            exit(1);
        }
    }
}

fn build_command(command: Commands) -> Result<Command, String> {
    Ok(match command {
        Commands::RegisterSchema { name, fields } => Command::RegisterSchema {
            name,
            schema: parse_schema(&fields)?,
        },
        Commands::CreateCollection { name, schema } => Command::CreateCollection {
            name,
            schema_name: schema,
        },
        Commands::Schema { name } => Command::GetSchema { name },
        Commands::CollectionSchema { name } => Command::GetCollectionSchema { name },
        Commands::Get {
            collection,
            key,
            hex,
        } => Command::Get {
            collection,
            key: key_bytes(&key, hex)?,
        },
        Commands::Put { collection, record } => Command::Put {
            collection,
            record: parse_hex(&record)?,
        },
        Commands::Del {
            collection,
            key,
            hex,
        } => Command::Delete {
            collection,
            key: key_bytes(&key, hex)?,
        },
        Commands::Ping => Command::Ping,
    })
}

fn print_response(response: &Response) {
    match response {
        Response::Success => println!("OK"),
        Response::NotFound => println!("(not found)"),
        Response::InvalidCommand => println!("(invalid command)"),
        Response::Error { message } => println!("ERROR: {message}"),
        Response::Found { record } => println!("{}", to_hex(record)),
        Response::Schema { schema } => print_schema(schema),
        Response::Pong => println!("PONG"),
    }
}

fn print_schema(schema: &Schema) {
    print_fields(schema.fields(), Some(schema.key_field_index() as usize), 0);
    println!("  # size {} bytes", schema.size());
}

fn print_fields(fields: &[Field], key_index: Option<usize>, indent: usize) {
    for (i, field) in fields.iter().enumerate() {
        print!("{}", "\t".repeat(indent));

        if key_index == Some(i) {
            print!("key ");
        }

        match &field.ty {
            FieldType::String { capacity } => println!("{} string<{}>", field.name, capacity),
            FieldType::Aggregate(members) => {
                println!("{} {{", field.name);
                print_fields(members, None, indent + 1);
                println!("{}}}", "\t".repeat(indent));
            }
            scalar => println!("{} {}", field.name, scalar_name(scalar)),
        }
    }
}

fn scalar_name(ty: &FieldType) -> &'static str {
    match ty {
        FieldType::Bool => "bool",
        FieldType::UInt8 => "uint8",
        FieldType::UInt16 => "uint16",
        FieldType::UInt32 => "uint32",
        FieldType::UInt64 => "uint64",
        FieldType::Int8 => "int8",
        FieldType::Int16 => "int16",
        FieldType::Int32 => "int32",
        FieldType::Int64 => "int64",
        FieldType::Float32 => "float32",
        FieldType::Float64 => "float64",
        _ => "?",
    }
}

// =============================================================================
// Field DSL
// =============================================================================

fn parse_schema(spec: &str) -> Result<Schema, String> {
    let mut fields = Vec::new();
    let mut key_field_index = 0u32;

    for entry in spec.split(',') {
        let entry = entry.trim();

        let entry = match entry.strip_prefix("key:") {
            Some(rest) => {
                key_field_index = fields.len() as u32;
                rest
            }
            None => entry,
        };

        let (name, ty) = entry
            .split_once(':')
            .ok_or_else(|| format!("field '{entry}' is not name:type"))?;

        fields.push(Field::new(name, parse_type(ty)?));
    }

    Schema::new(fields, key_field_index).map_err(|e| e.to_string())
}

fn parse_type(ty: &str) -> Result<FieldType, String> {
    Ok(match ty {
        "bool" => FieldType::Bool,
        "uint8" => FieldType::UInt8,
        "uint16" => FieldType::UInt16,
        "uint32" => FieldType::UInt32,
        "uint64" => FieldType::UInt64,
        "int8" => FieldType::Int8,
        "int16" => FieldType::Int16,
        "int32" => FieldType::Int32,
        "int64" => FieldType::Int64,
        "float32" => FieldType::Float32,
        "float64" => FieldType::Float64,
        _ => {
            let capacity = ty
                .strip_prefix("string<")
                .and_then(|rest| rest.strip_suffix('>'))
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| format!("unknown field type '{ty}'"))?;

            FieldType::String { capacity }
        }
    })
}

// =============================================================================
// Hex helpers
// =============================================================================

fn key_bytes(key: &str, hex: bool) -> Result<Vec<u8>, String> {
    if hex {
        parse_hex(key)
    } else {
        Ok(key.as_bytes().to_vec())
    }
}

fn parse_hex(s: &str) -> Result<Vec<u8>, String> {
    let s: String = s.chars().filter(|c| !c.is_whitespace()).collect();

    if s.len() % 2 != 0 {
        return Err("hex input has an odd number of digits".to_string());
    }

    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16)
                .map_err(|_| format!("invalid hex byte '{}'", &s[i..i + 2]))
        })
        .collect()
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
