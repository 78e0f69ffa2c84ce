//! Moving between the conversation list and everything above it.

use chatex_protocol::keycode;
use tracing::debug;

use crate::automation::Automation;
use crate::context::EngineContext;
use crate::error::Result;

/// Back presses allowed when returning to the conversation list.
pub const MAX_BACK_PRESSES: usize = 3;

/// Poll the foreground activity until `accept` holds or the poll budget runs out.
pub async fn wait_for_activity<F>(ui: &dyn Automation, ctx: &EngineContext, accept: F) -> Result<bool>
where
	F: Fn(&str) -> bool,
{
	for attempt in 0..ctx.timings.poll_attempts {
		let activity = ui.current_activity().await?;
		if accept(&activity) {
			return Ok(true);
		}
		debug!(target = "chatex.session", attempt, %activity, "waiting for activity");
		ctx.sleep(ctx.timings.poll).await;
	}
	Ok(false)
}

/// True when the target app's conversation list is in the foreground.
pub async fn is_home(ui: &dyn Automation, ctx: &EngineContext) -> Result<bool> {
	if ui.current_package().await? != ctx.profile.package {
		return Ok(false);
	}
	Ok(ctx.profile.is_home_activity(&ui.current_activity().await?))
}

/// Press back (at most [`MAX_BACK_PRESSES`] times) until the conversation list shows.
pub async fn back_to_main(ui: &dyn Automation, ctx: &EngineContext) -> Result<bool> {
	for presses in 0..=MAX_BACK_PRESSES {
		if is_home(ui, ctx).await? {
			return Ok(true);
		}
		if presses == MAX_BACK_PRESSES {
			break;
		}
		ui.press_key(keycode::BACK).await?;
		ctx.sleep(ctx.timings.poll).await;
	}
	debug!(target = "chatex.session", "conversation list not reached");
	Ok(false)
}

/// Return to the conversation list from somewhere inside the target app.
///
/// Returns `false` without pressing anything when another app is in front.
pub async fn to_main(ui: &dyn Automation, ctx: &EngineContext) -> Result<bool> {
	if ui.current_package().await? != ctx.profile.package {
		return Ok(false);
	}
	back_to_main(ui, ctx).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::{FakeUi, TestClock, View};

	fn ctx() -> EngineContext {
		EngineContext::new(Default::default(), Default::default(), TestClock::new())
	}

	#[tokio::test]
	async fn back_to_main_from_nested_menu() {
		let ui = FakeUi::app_with_names(&["Alice"]);
		ui.set_view(View::Home);
		ui.click(&ui.find_all(&crate::automation::Query::text(crate::automation::TextMatch::exact("Alice"))).await.unwrap()[0])
			.await
			.unwrap();
		assert_eq!(ui.view(), View::Conversation("Alice".into()));

		assert!(back_to_main(&ui, &ctx()).await.unwrap());
		assert_eq!(ui.view(), View::Home);
		assert_eq!(ui.keys(), vec![keycode::BACK]);
	}

	#[tokio::test]
	async fn already_home_presses_nothing() {
		let ui = FakeUi::app_with_names(&["Alice"]);
		assert!(to_main(&ui, &ctx()).await.unwrap());
		assert!(ui.keys().is_empty());
	}

	#[tokio::test]
	async fn other_app_is_left_alone() {
		let ui = FakeUi::app_with_names(&["Alice"]);
		ui.set_view(View::Launcher);
		assert!(!to_main(&ui, &ctx()).await.unwrap());
		assert!(ui.keys().is_empty());
	}

	#[tokio::test]
	async fn back_presses_are_bounded() {
		let ui = FakeUi::app_with_names(&["Alice"]);
		ui.set_view(View::Lock);
		assert!(!back_to_main(&ui, &ctx()).await.unwrap());
		assert_eq!(ui.keys().len(), MAX_BACK_PRESSES);
	}
}
