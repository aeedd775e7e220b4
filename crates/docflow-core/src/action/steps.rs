//! Steps shared by several policies.

use futures::FutureExt;

use super::policy::{creator_from, Step, StepContext, StepOutput};
use crate::domain::{ActionError, ActionParams, DocumentId};

/// Look up the first author of the target.
pub fn creator_lookup() -> Step {
    Step::custom(|ctx, _| lookup_creator(ctx).boxed())
}

async fn lookup_creator(ctx: StepContext) -> Result<StepOutput, ActionError> {
    let target = &ctx.params.target;
    let creator = ctx
        .session
        .store()
        .creator(target)
        .await
        .map_err(|e| e.into_action(target))?;
    tracing::debug!(document = %target, ?creator, "creator looked up");
    Ok(StepOutput::Creator(creator))
}

/// Send `notice(params, inputs)` to the creator's talk page.
///
/// Skipped when notification is off, the creator is unknown, or the creator
/// is the person performing the action.
pub fn notify_creator(notice: fn(&ActionParams, &[StepOutput]) -> String) -> Step {
    Step::custom(move |ctx, inputs| notify(ctx, inputs, notice).boxed())
}

async fn notify(
    ctx: StepContext,
    inputs: Vec<StepOutput>,
    notice: fn(&ActionParams, &[StepOutput]) -> String,
) -> Result<StepOutput, ActionError> {
    if !ctx.params.notify_creator {
        return Ok(StepOutput::Skipped("notification disabled".to_string()));
    }
    let Some(creator) = creator_from(&inputs) else {
        return Ok(StepOutput::Skipped("creator unknown".to_string()));
    };
    if creator == ctx.params.requested_by {
        return Ok(StepOutput::Skipped("creator performed the action".to_string()));
    }

    let talk = DocumentId::user_talk(creator);
    ctx.notifier.notify(&talk, &notice(&ctx.params, &inputs)).await;
    tracing::info!(recipient = %talk, "creator notified");
    Ok(StepOutput::Done)
}
