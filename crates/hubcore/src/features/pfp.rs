//! Profile picture gallery (`/pfp`).
//!
//! `/pfp` sends a random picture; `list`, `get <id>`, and for admins `add`
//! and `delete <id>`. `add` collects a name and an image over several
//! messages through a user hook.

use futures_util::FutureExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::hub::Ctx;
use crate::router::keyboard::{Button, Keyboard};
use crate::session::hook::MessageHook;
use crate::session::interaction::{Interaction, Interactive};
use crate::session::path::CommandPath;
use crate::storage::StoredFile;
use crate::transport::IncomingMessage;

pub const PATH: &str = "pfp";
const PREFIX: &str = "pfp";
const ROW_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftStep {
    Name,
    Photo,
}

/// A picture being added: the name may arrive before the image.
#[derive(Debug, Clone)]
pub struct PfpDraft {
    interaction: Interaction<DraftStep>,
    name: Option<String>,
}

impl PfpDraft {
    pub fn new() -> Self {
        Self {
            interaction: Interaction::new(DraftStep::Name),
            name: None,
        }
    }
}

impl Default for PfpDraft {
    fn default() -> Self {
        Self::new()
    }
}

impl Interactive for PfpDraft {
    type State = DraftStep;

    fn interaction(&self) -> &Interaction<DraftStep> {
        &self.interaction
    }

    fn interaction_mut(&mut self) -> &mut Interaction<DraftStep> {
        &mut self.interaction
    }
}

/// Routed action for `pfp/<verb>/<args>`.
pub async fn dispatch(ctx: Ctx, mut path: CommandPath) {
    let verb = path.take();
    match verb.as_str() {
        "" => random(&ctx).await,
        "list" => list(&ctx).await,
        "get" => get(&ctx, &path.take()).await,
        "add" => add(&ctx).await,
        "delete" => delete(&ctx, &path.take()).await,
        other => log::debug!("Unknown pfp action {:?}", other),
    }
}

async fn say(ctx: &Ctx, text: &str) {
    if let Err(e) = ctx.send(text, None).await {
        log::warn!("Failed to send pfp message to chat {}: {}", ctx.chat.id, e);
    }
}

async fn send_photo(ctx: &Ctx, file: &StoredFile) {
    if let Err(e) = ctx.transport().send_photo(ctx.chat.id, &file.file_id, Some(&file.name)).await {
        log::warn!("Failed to send pfp {}: {}", file.unique_id, e);
    }
}

fn files(ctx: &Ctx) -> Option<Vec<StoredFile>> {
    match ctx.store().list_files(PREFIX) {
        Ok(files) => Some(files),
        Err(e) => {
            log::warn!("Failed to list pfps: {}", e);
            None
        }
    }
}

async fn random(ctx: &Ctx) {
    let Some(files) = files(ctx) else {
        return;
    };
    if files.is_empty() {
        say(ctx, "No PFPs found :(").await;
        return;
    }
    let mut rng = StdRng::seed_from_u64(ctx.hub.next_seed());
    let pick = &files[rng.gen_range(0..files.len())];
    send_photo(ctx, pick).await;
}

/// Gallery keyboard, three pictures per row.
pub fn gallery(files: &[StoredFile]) -> Keyboard {
    let rows = files
        .chunks(ROW_WIDTH)
        .map(|chunk| {
            chunk
                .iter()
                .map(|f| Button::callback(format!("{} 👀", f.name), format!("cmd|{PATH}/get/{}", f.unique_id)))
                .collect()
        })
        .collect();
    Keyboard::new(rows)
}

async fn list(ctx: &Ctx) {
    let Some(files) = files(ctx) else {
        return;
    };
    if files.is_empty() {
        say(ctx, "No PFPs found :(").await;
        return;
    }
    if let Err(e) = ctx.send("🎨 PFPs 📸", Some(&gallery(&files))).await {
        log::warn!("Failed to send pfp gallery: {}", e);
    }
}

async fn get(ctx: &Ctx, unique_id: &str) {
    if unique_id.is_empty() {
        return;
    }
    match ctx.store().get_file(unique_id) {
        Ok(Some(file)) => send_photo(ctx, &file).await,
        Ok(None) => log::debug!("No pfp {}", unique_id),
        Err(e) => log::warn!("Failed to load pfp {}: {}", unique_id, e),
    }
}

async fn delete(ctx: &Ctx, unique_id: &str) {
    if !ctx.config().is_admin(ctx.user.id) || unique_id.is_empty() {
        return;
    }
    match ctx.store().delete_file(unique_id) {
        Ok(true) => say(ctx, "✅ File deleted").await,
        Ok(false) => say(ctx, "No such file.").await,
        Err(e) => log::warn!("Failed to delete pfp {}: {}", unique_id, e),
    }
}

async fn add(ctx: &Ctx) {
    if !ctx.config().is_admin(ctx.user.id) {
        log::info!("User {} tried to add a pfp", ctx.user.id);
        return;
    }

    ctx.sessions().pfp_drafts.insert(ctx.user.id, PfpDraft::new());
    let hook = MessageHook::new(ctx.config().session_ttl, |ctx: Ctx, message: IncomingMessage| {
        collect(ctx, message).boxed()
    });
    ctx.hub.hooks().set_user_hook(ctx.user.id, hook);

    say(ctx, "Send a name & image you'd like to add to /pfp").await;
}

/// User hook armed by `add`: a captioned image finishes at once, otherwise a
/// name and an image are taken from separate messages.
async fn collect(ctx: Ctx, message: IncomingMessage) -> bool {
    let drafts = &ctx.sessions().pfp_drafts;
    let Some(slot) = drafts.get(&ctx.user.id) else {
        return true;
    };
    let mut draft = slot.lock().await;

    if let Some(text) = message.body().map(str::trim).filter(|s| !s.is_empty()) {
        draft.name = Some(text.to_string());
    }

    let Some(photo) = message.photo.clone() else {
        if draft.name.is_some() {
            draft.mutate(DraftStep::Photo, None);
            say(&ctx, "Perfect, now send an image.").await;
        } else {
            say(&ctx, "Great, now send a name for the image.").await;
        }
        return false;
    };

    let Some(name) = draft.name.clone() else {
        draft.touch();
        say(&ctx, "Great, now send a name for the image.").await;
        return false;
    };

    let file = StoredFile {
        unique_id: photo.unique_id,
        file_id: photo.file_id,
        prefix: PREFIX.to_string(),
        name,
    };
    match ctx.store().save_file(&file) {
        Ok(()) => say(&ctx, "Image added to /pfp.").await,
        Err(e) => {
            log::warn!("Failed to save pfp {}: {}", file.unique_id, e);
            say(&ctx, "Oops, something went wrong.").await;
        }
    }
    drop(draft);
    drafts.remove(&ctx.user.id);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(n: usize) -> StoredFile {
        StoredFile {
            unique_id: format!("u{n}"),
            file_id: format!("f{n}"),
            prefix: PREFIX.into(),
            name: format!("pic{n}"),
        }
    }

    #[test]
    fn test_gallery_rows_of_three() {
        let files: Vec<StoredFile> = (0..7).map(file).collect();
        let markup = gallery(&files);
        let widths: Vec<usize> = markup.rows.iter().map(Vec::len).collect();
        assert_eq!(widths, vec![3, 3, 1]);
        assert_eq!(markup.rows[2][0].text, "pic6 👀");
        assert_eq!(markup.rows[0][1].data(), Some("cmd|pfp/get/u1"));
    }
}
