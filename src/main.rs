use protostrict::Context;
use std::env;
use std::io::Read;
use std::process;

const USAGE: &str = "Usage: protostrict <schema.proto> <Message.Name> <hex payload>";

fn main()
{
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    let (schema, message, payload) = match args.as_slice() {
        [schema, message, payload] => (schema, message, payload),
        _ => {
            eprintln!("{}", USAGE);
            process::exit(2);
        }
    };

    match run(schema, message, payload) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{}", e);
            process::exit(2);
        }
    }
}

/// Decodes the payload and reports the outcome. Returns `false` if the payload was rejected.
fn run(schema: &str, message: &str, payload: &str) -> Result<bool, Box<dyn std::error::Error>>
{
    let mut file = std::fs::File::open(schema)?;
    let mut source = String::new();
    file.read_to_string(&mut source)?;

    let context = Context::parse(&[source])?;
    let info = context
        .get_message(message)
        .ok_or_else(|| format!("Message '{}' not found in {}", message, schema))?;
    let data = hex::decode(payload.trim())?;

    match info.decode(&data, &context) {
        Ok(value) => {
            println!("{:#?}", value);
            Ok(true)
        }
        Err(e) => {
            println!("Rejected ({:?}): {}", e.kind(), e);
            Ok(false)
        }
    }
}
