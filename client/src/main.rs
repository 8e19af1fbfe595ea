use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Server address to connect to
    #[arg(short = 's', long, default_value = "127.0.0.1:8080")]
    server: String,

    /// Display name to request on connect (3-16 alphanumeric characters)
    #[arg(short = 'n', long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    println!("Commands: /ready /unready /name <n> /move <n|s|e|w> /stop /turn <deg> /color <c> /reload /start /kick <id> /roster /quit");
    println!("Anything else is chat; @<id> <text> whispers.");

    let mut client = client::network::Client::new(&args.server, args.name).await?;
    client.run().await?;

    Ok(())
}
