//! Server, device and session brought up together and torn down in reverse.

use std::sync::Arc;
use std::time::Duration;

use chatex::{AdbDevice, EngineContext, RemoteSessionFactory, SessionManager, TokioClock, Transport};
use chatex_runtime::server::is_running;
use chatex_runtime::{Adb, AutomationServer, Connection};
use tracing::{info, warn};

use crate::cli::ConnectArgs;
use crate::config::ChatexConfig;
use crate::device_select::select_device;
use crate::error::{CliError, Result};
use crate::prompt::Prompter;

const SERVER_READY_TIMEOUT: Duration = Duration::from_secs(30);

pub struct Stack {
	server: Option<AutomationServer>,
	pub session: SessionManager,
	pub ctx: EngineContext,
}

impl Stack {
	/// Start (or reuse) the server, pick a device and open a verified session.
	pub async fn open(config: &ChatexConfig, args: &ConnectArgs, prompter: &mut Prompter) -> Result<Self> {
		let url = config.server_url(args)?;
		let server = if is_running(&url).await {
			info!(target = "chatex.cli", %url, "using running automation server");
			None
		} else if args.skip_server || args.server_url.is_some() {
			return Err(CliError::ServerUnavailable {
				url: url.to_string(),
				source: None,
			});
		} else {
			let server = AutomationServer::launch(&config.endpoint(args), SERVER_READY_TIMEOUT)
				.await
				.map_err(|e| CliError::ServerUnavailable {
					url: url.to_string(),
					source: Some(e),
				})?;
			Some(server)
		};

		match Self::connect(config, args, prompter, url).await {
			Ok((session, ctx)) => Ok(Self { server, session, ctx }),
			Err(err) => {
				stop_server(server).await;
				Err(err)
			}
		}
	}

	async fn connect(config: &ChatexConfig, args: &ConnectArgs, prompter: &mut Prompter, url: url::Url) -> Result<(SessionManager, EngineContext)> {
		let adb = Adb::locate()?;
		let serial = select_device(&adb, prompter, config.device(args).as_deref(), args.wireless_adb).await?;
		let transport = Transport::from_serial(&serial);
		info!(target = "chatex.cli", serial = %serial, %transport, "using device");

		let connection = Connection::new(url, transport.bridge_timeout() + Duration::from_secs(30))?;
		let ctx = EngineContext::new(config.app.clone(), config.timings, Arc::new(TokioClock));
		let mut session = SessionManager::new(
			Box::new(RemoteSessionFactory::new(connection)),
			Box::new(AdbDevice::new(&adb, serial)),
			ctx.clone(),
		);
		session.connect().await?;
		Ok((session, ctx))
	}

	/// Quit the session, then stop a server this process started.
	pub async fn close(mut self) {
		self.session.quit().await;
		stop_server(self.server.take()).await;
	}
}

async fn stop_server(server: Option<AutomationServer>) {
	if let Some(server) = server {
		if let Err(err) = server.shutdown().await {
			warn!(target = "chatex.cli", error = %err, "automation server did not stop cleanly");
		}
	}
}
