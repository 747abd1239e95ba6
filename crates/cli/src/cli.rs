use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "edwix-shell")]
#[command(about = "Inspect and simulate the edwix shell session bridge")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Load environment variables from this file instead of `.env`
	#[arg(long, global = true, value_name = "FILE")]
	pub env_file: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Validate configuration and print the resolved settings
	Check,

	/// Print the frame URL for a host path
	FrameUrl { path: String },

	/// Run a bridge over in-memory ports, driven by JSON lines on stdin
	#[command(alias = "sim")]
	Simulate(SimulateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
	/// Initial host path
	#[arg(long, default_value = "/")]
	pub path: String,

	/// Start with a host session holding this access token
	#[arg(long, value_name = "TOKEN")]
	pub session_token: Option<String>,

	/// Refresh token paired with --session-token
	#[arg(long, value_name = "TOKEN", default_value = "simulated-refresh")]
	pub refresh_token: String,

	/// Initial property id
	#[arg(long, value_name = "ID", requires = "property_name")]
	pub property_id: Option<String>,

	/// Initial property name
	#[arg(long, value_name = "NAME", requires = "property_id")]
	pub property_name: Option<String>,
}

impl Default for SimulateArgs {
	fn default() -> Self {
		Self {
			path: "/".to_string(),
			session_token: None,
			refresh_token: "simulated-refresh".to_string(),
			property_id: None,
			property_name: None,
		}
	}
}
