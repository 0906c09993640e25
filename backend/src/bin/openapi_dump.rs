//! Write the feed API's OpenAPI document to stdout as pretty JSON.
//!
//! Used to publish the contract for client generators without starting the
//! server.

use std::io::Write;

use color_eyre::eyre::{Context, Result};
use feed_backend::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<()> {
    color_eyre::install()?;
    let document = ApiDoc::openapi()
        .to_pretty_json()
        .wrap_err("failed to serialise OpenAPI document")?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{document}").wrap_err("failed to write OpenAPI document")?;
    Ok(())
}
