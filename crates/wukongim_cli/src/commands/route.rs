//! Route command implementation.

use super::{print_json, CliClient};

/// Runs the route command.
pub fn run(client: &CliClient, uid: &str, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let route = client.route(uid)?;

    match format {
        "json" => print_json(&route)?,
        _ => {
            println!("Route for {uid}");
            println!("  TCP: {}", route.tcp_addr);
            println!("  WS:  {}", route.ws_addr);
            if let Some(wss) = &route.wss_addr {
                println!("  WSS: {wss}");
            }
        }
    }
    Ok(())
}

/// Runs the route-batch command.
pub fn run_batch(
    client: &CliClient,
    uids: &[String],
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let routes = client.route_batch(uids)?;

    match format {
        "json" => print_json(&routes)?,
        _ => {
            for route in &routes {
                println!("{} / {}", route.tcp_addr, route.ws_addr);
                for uid in &route.uids {
                    println!("  {uid}");
                }
            }
        }
    }
    Ok(())
}
