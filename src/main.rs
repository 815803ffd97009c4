//! Command-line interface for soapbind

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use soapbind::mapping::FieldKind;
#[cfg(feature = "cli")]
use soapbind::{wsdl, ClientConfig, DecodeMode, SoapClient, TypedValue, WsdlService};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "soapbind")]
#[command(author, version, about = "WSDL inspection and SOAP invocation tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect a WSDL: service summary, operations, mapped types
    Inspect {
        /// Path to the WSDL file
        #[arg(value_name = "WSDL")]
        wsdl: PathBuf,

        /// Supplemental XSD files extending the service's schema
        #[arg(short, long, value_name = "XSD")]
        schema: Vec<PathBuf>,

        /// Show the mapped types
        #[arg(long)]
        types: bool,

        /// Show the operations
        #[arg(long)]
        operations: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Print the request envelope an operation invocation would send
    Envelope {
        /// Path to the WSDL file
        #[arg(value_name = "WSDL")]
        wsdl: PathBuf,

        /// Operation name
        #[arg(value_name = "OPERATION")]
        operation: String,

        /// Request field values as name=value pairs
        #[arg(value_name = "ARGS")]
        args: Vec<String>,

        /// Supplemental XSD files extending the service's schema
        #[arg(short, long, value_name = "XSD")]
        schema: Vec<PathBuf>,
    },

    /// Invoke an operation against the service's endpoint
    Invoke {
        /// Path to the WSDL file
        #[arg(value_name = "WSDL")]
        wsdl: PathBuf,

        /// Operation name
        #[arg(value_name = "OPERATION")]
        operation: String,

        /// Request field values as name=value pairs
        #[arg(value_name = "ARGS")]
        args: Vec<String>,

        /// Supplemental XSD files extending the service's schema
        #[arg(short, long, value_name = "XSD")]
        schema: Vec<PathBuf>,

        /// Endpoint override
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Tolerate malformed response fields instead of failing
        #[arg(long)]
        lax: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect {
            wsdl,
            schema,
            types,
            operations,
            json,
        } => cmd_inspect(wsdl, schema, types, operations, json),
        Commands::Envelope {
            wsdl,
            operation,
            args,
            schema,
        } => cmd_envelope(wsdl, operation, args, schema),
        Commands::Invoke {
            wsdl,
            operation,
            args,
            schema,
            endpoint,
            lax,
        } => cmd_invoke(wsdl, operation, args, schema, endpoint, lax),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn load_service(
    wsdl_path: &PathBuf,
    schemas: &[PathBuf],
) -> Result<WsdlService, Box<dyn std::error::Error>> {
    let mut service = wsdl::from_file(wsdl_path)?;
    for path in schemas {
        let content = std::fs::read_to_string(path)?;
        wsdl::add_schema(&mut service, &content)?;
    }
    Ok(service)
}

#[cfg(feature = "cli")]
fn cmd_inspect(
    wsdl_path: PathBuf,
    schemas: Vec<PathBuf>,
    show_types: bool,
    show_operations: bool,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = load_service(&wsdl_path, &schemas)?;
    let client = SoapClient::new(service);
    let service = client.service();
    let mapping = client.mapping();

    if json_output {
        let mut summary = serde_json::json!({
            "service": service.name,
            "targetNamespace": service.target_namespace,
            "endpoint": service.endpoint,
            "operations": service.operations.iter().map(|op| {
                serde_json::json!({
                    "name": op.name,
                    "input": op.input_element,
                    "output": op.output_element,
                    "soapAction": op.soap_action,
                })
            }).collect::<Vec<_>>(),
        });
        if show_types {
            summary["mapping"] = mapping.to_json();
        }
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Service: {}", service.name);
    println!("Target namespace: {}", service.target_namespace);
    if let Some(endpoint) = &service.endpoint {
        println!("Endpoint: {}", endpoint);
    }
    println!(
        "{} operation(s), {} mapped type(s)",
        service.operation_count(),
        mapping.len()
    );

    if show_operations || !show_types {
        println!();
        println!("Operations:");
        for op in &service.operations {
            let output = op.output_element.as_deref().unwrap_or("(one-way)");
            println!("  {} : {} -> {}", op.name, op.input_element, output);
        }
    }

    if show_types {
        println!();
        println!("Mapped types:");
        for (name, mapped) in mapping.iter() {
            println!("  {}", name);
            for field in &mapped.fields {
                println!("    {} : {}", field.ident, field.kind.label());
            }
        }
    }

    if !mapping.errors().is_empty() {
        println!();
        println!("Unmapped types:");
        for (name, reason) in mapping.errors() {
            println!("  {} : {}", name, reason);
        }
    }
    if !service.errors.is_empty() {
        println!();
        println!("Parse warnings:");
        for error in &service.errors {
            println!("  {}", error.message);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_envelope(
    wsdl_path: PathBuf,
    operation: String,
    args: Vec<String>,
    schemas: Vec<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = load_service(&wsdl_path, &schemas)?;
    let client = SoapClient::new(service);

    let request = build_request(&client, &operation, &args)?;
    let envelope = client.build_envelope(&operation, &request)?;
    println!("{}", envelope.to_xml_string_pretty()?);
    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_invoke(
    wsdl_path: PathBuf,
    operation: String,
    args: Vec<String>,
    schemas: Vec<PathBuf>,
    endpoint: Option<String>,
    lax: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let service = load_service(&wsdl_path, &schemas)?;

    let mut config = ClientConfig::default();
    if let Some(endpoint) = endpoint {
        config = config.with_endpoint(endpoint);
    }
    if lax {
        config = config.with_decode_mode(DecodeMode::Lax);
    }
    let client = SoapClient::with_config(service, config);

    let request = build_request(&client, &operation, &args)?;
    let response = client.invoke(&operation, request)?;
    println!("{}", serde_json::to_string_pretty(&response.to_json())?);
    Ok(())
}

/// Build a request value from name=value arguments
///
/// Values are coerced per the mapped field's primitive kind; complex
/// and array fields cannot be set from the command line.
#[cfg(feature = "cli")]
fn build_request(
    client: &SoapClient,
    operation: &str,
    args: &[String],
) -> Result<TypedValue, Box<dyn std::error::Error>> {
    let mut request = client.request(operation)?;
    let mapped = client
        .mapping()
        .get(&request.type_name)
        .ok_or_else(|| format!("type '{}' is not mapped", request.type_name))?
        .clone();

    for arg in args {
        let Some((name, text)) = arg.split_once('=') else {
            return Err(format!("argument '{}' is not a name=value pair", arg).into());
        };
        let field = mapped
            .field(name)
            .ok_or_else(|| format!("'{}' has no field '{}'", mapped.name, name))?;
        match &field.kind {
            FieldKind::Primitive(primitive) => {
                request.set(field.ident.clone(), primitive.parse(text)?);
            }
            other => {
                return Err(format!(
                    "field '{}' is {}; only primitive fields can be set from arguments",
                    name,
                    other.label()
                )
                .into())
            }
        }
    }

    Ok(request)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
