use std::io;

use chat_terminal::{ctrl_c, run_shell};
use codementor::chat_api::ChatApiClient;
use codementor::{logging, ChatSession, EnvConfig};

fn main() -> io::Result<()> {
    let config = EnvConfig::from_env();
    logging::init(&config.log_filter);

    let client = ChatApiClient::new(config.api_config()).map_err(io::Error::other)?;
    tracing::info!(endpoint = client.endpoint(), "chat relay configured");
    let mut session = ChatSession::new(client, config.session_options());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    let result = runtime.block_on(run_shell(&mut session, stdin, &mut stdout, ctrl_c));
    // A stdin read may still be parked on the blocking pool.
    runtime.shutdown_background();
    result
}
