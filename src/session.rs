//! Per-page mint sessions.
//!
//! A session is created when a detail page mounts and owns that page's mint
//! flow, dialog flag, and a one-shot toast. Sessions are keyed by a random
//! cookie id; remounting (navigating to a detail page again) resets the flow.
//! Abandoned sessions are pruned oldest-first once the map hits capacity.

use crate::mint::{DropContext, MintError, MintFlow};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Instant;

pub const SESSION_COOKIE: &str = "gallery_session";

const MAX_SESSIONS: usize = 4096;

/// Transient status notification, shown once after a redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl Toast {
    fn success(message: &str) -> Self {
        Self {
            kind: ToastKind::Success,
            message: message.into(),
        }
    }

    fn error(message: &str) -> Self {
        Self {
            kind: ToastKind::Error,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct MintSession {
    slug: String,
    contract: String,
    flow: MintFlow,
    ctx: Option<DropContext>,
    dialog_open: bool,
    toast: Option<Toast>,
    created: Instant,
}

/// Everything the detail page renders from its session.
#[derive(Debug, Clone)]
pub struct PageView {
    pub flow: MintFlow,
    pub ctx: Option<DropContext>,
    pub dialog_open: bool,
    pub toast: Option<Toast>,
}

/// A mint the session has committed to; the flow is already `Minting`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintIntent {
    pub contract: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeginError {
    /// Unknown cookie or a session mounted for a different page.
    NoSession,
    Flow(MintError),
}

/// In-memory session map shared across handlers.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, MintSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Mount a detail page: reuse the cookie's session when it belongs to
    /// the same page, otherwise start fresh. Returns the session id and the
    /// render view, consuming any pending toast.
    pub fn mount(
        &self,
        existing: Option<&str>,
        slug: &str,
        contract: &str,
        ctx: DropContext,
    ) -> (String, PageView) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(id) = existing {
            if let Some(session) = sessions.get_mut(id) {
                if session.slug == slug {
                    // A reload while a claim is in flight keeps the guard up.
                    if !session.flow.in_flight() {
                        session.flow = MintFlow::resolve(&ctx);
                    }
                    session.contract = contract.to_string();
                    session.ctx = Some(ctx);
                    let view = PageView {
                        flow: session.flow.clone(),
                        ctx: session.ctx.clone(),
                        dialog_open: session.dialog_open,
                        toast: session.toast.take(),
                    };
                    return (id.to_string(), view);
                }
            }
        }

        if sessions.len() >= MAX_SESSIONS {
            prune_oldest(&mut sessions);
        }

        let id = new_session_id();
        let flow = MintFlow::resolve(&ctx);
        let view = PageView {
            flow: flow.clone(),
            ctx: Some(ctx.clone()),
            dialog_open: false,
            toast: None,
        };
        sessions.insert(
            id.clone(),
            MintSession {
                slug: slug.to_string(),
                contract: contract.to_string(),
                flow,
                ctx: Some(ctx),
                dialog_open: false,
                toast: None,
                created: Instant::now(),
            },
        );
        (id, view)
    }

    /// Commit to a mint: transitions the session's flow to `Minting` and
    /// hands back what the claim call needs. Rejecting here is what makes a
    /// second submission impossible while one is in flight.
    pub fn begin_mint(&self, id: &str, slug: &str) -> Result<MintIntent, BeginError> {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let session = sessions
            .get_mut(id)
            .filter(|s| s.slug == slug)
            .ok_or(BeginError::NoSession)?;

        let address = match session.ctx.as_ref().and_then(|c| c.address.clone()) {
            Some(address) => address,
            None => return Err(BeginError::Flow(MintError::NotMintable)),
        };

        session.flow.begin_mint().map_err(BeginError::Flow)?;

        Ok(MintIntent {
            contract: session.contract.clone(),
            address,
        })
    }

    /// Claim resolved. Success bumps the claimed count (exactly one unit per
    /// invocation), opens the dialog, and queues the success toast; failure
    /// queues the generic error toast and restores the prior state.
    pub fn finish_mint(&self, id: &str, success: bool) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        let Some(session) = sessions.get_mut(id) else {
            return;
        };

        if success {
            if let Some(ctx) = session.ctx.as_mut() {
                ctx.claimed = ctx.claimed.saturating_add(1);
            }
            session.dialog_open = true;
            session.toast = Some(Toast::success("Successfully minted!"));
        } else {
            session.toast = Some(Toast::error("Something went wrong."));
        }

        if let Some(ctx) = &session.ctx {
            session.flow.finish_mint(ctx);
        } else {
            session.flow = MintFlow::Loading;
        }
    }

    /// Pure UI transition; mint state is untouched.
    pub fn close_dialog(&self, id: &str) {
        let mut sessions = self.sessions.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(session) = sessions.get_mut(id) {
            session.dialog_open = false;
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn new_session_id() -> String {
    let mut rng = rand::thread_rng();
    format!("gal-{:016x}{:016x}", rng.gen::<u64>(), rng.gen::<u64>())
}

fn prune_oldest(sessions: &mut HashMap<String, MintSession>) {
    // Drop the oldest tenth; plenty for a map this size.
    let mut by_age: Vec<(String, Instant)> = sessions
        .iter()
        .map(|(id, s)| (id.clone(), s.created))
        .collect();
    by_age.sort_by_key(|(_, created)| *created);
    for (id, _) in by_age.iter().take(MAX_SESSIONS / 10) {
        sessions.remove(id);
    }
}

/// Extract the session id from a `Cookie` request header value.
pub fn session_id_from_cookies(cookie_header: &str) -> Option<String> {
    cookie_header.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mint::ClaimPrice;

    fn ctx(address: Option<&str>, claimed: u64, total: u128) -> DropContext {
        DropContext {
            address: address.map(String::from),
            claimed,
            total,
            price: ClaimPrice {
                amount: "0.01".into(),
                currency: "ETH".into(),
            },
        }
    }

    #[test]
    fn mount_creates_ready_session() {
        let store = SessionStore::new();
        let (id, view) = store.mount(None, "bayc", "0xdrop", ctx(Some("0xabc"), 5, 100));
        assert!(view.flow.is_enabled());
        assert!(!view.dialog_open);
        assert!(view.toast.is_none());
        assert!(!id.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn successful_mint_updates_guard_and_opens_dialog() {
        let store = SessionStore::new();
        let (id, _) = store.mount(None, "bayc", "0xdrop", ctx(Some("0xabc"), 99, 100));

        let intent = store.begin_mint(&id, "bayc").unwrap();
        assert_eq!(intent.contract, "0xdrop");
        assert_eq!(intent.address, "0xabc");

        store.finish_mint(&id, true);

        // The redirect remounts the page; claimed is now 100/100.
        let (_, view) = store.mount(Some(id.as_str()), "bayc", "0xdrop", ctx(Some("0xabc"), 100, 100));
        assert_eq!(view.flow.button().label, "Sold Out");
        assert!(view.dialog_open);
        let toast = view.toast.unwrap();
        assert_eq!(toast.kind, ToastKind::Success);
    }

    #[test]
    fn failed_mint_restores_state_and_queues_error_toast() {
        let store = SessionStore::new();
        let (id, before) = store.mount(None, "bayc", "0xdrop", ctx(Some("0xabc"), 5, 100));

        store.begin_mint(&id, "bayc").unwrap();
        store.finish_mint(&id, false);

        let (_, view) = store.mount(Some(id.as_str()), "bayc", "0xdrop", ctx(Some("0xabc"), 5, 100));
        assert_eq!(view.flow, before.flow);
        assert!(!view.dialog_open);
        assert_eq!(view.toast.unwrap().kind, ToastKind::Error);
    }

    #[test]
    fn second_mint_rejected_while_first_in_flight() {
        let store = SessionStore::new();
        let (id, _) = store.mount(None, "bayc", "0xdrop", ctx(Some("0xabc"), 5, 100));

        store.begin_mint(&id, "bayc").unwrap();
        assert_eq!(
            store.begin_mint(&id, "bayc"),
            Err(BeginError::Flow(MintError::AlreadyMinting))
        );
    }

    #[test]
    fn remount_during_flight_keeps_guard_up() {
        let store = SessionStore::new();
        let (id, _) = store.mount(None, "bayc", "0xdrop", ctx(Some("0xabc"), 5, 100));
        store.begin_mint(&id, "bayc").unwrap();

        let (_, view) = store.mount(Some(id.as_str()), "bayc", "0xdrop", ctx(Some("0xabc"), 5, 100));
        assert!(view.flow.in_flight());
        assert!(!view.flow.is_enabled());
    }

    #[test]
    fn mint_without_wallet_rejected() {
        let store = SessionStore::new();
        let (id, _) = store.mount(None, "bayc", "0xdrop", ctx(None, 5, 100));
        assert_eq!(
            store.begin_mint(&id, "bayc"),
            Err(BeginError::Flow(MintError::NotMintable))
        );
    }

    #[test]
    fn session_is_bound_to_its_page() {
        let store = SessionStore::new();
        let (id, _) = store.mount(None, "bayc", "0xdrop", ctx(Some("0xabc"), 5, 100));
        assert_eq!(store.begin_mint(&id, "punks"), Err(BeginError::NoSession));
    }

    #[test]
    fn navigating_to_another_page_starts_fresh() {
        let store = SessionStore::new();
        let (id, _) = store.mount(None, "bayc", "0xdrop", ctx(Some("0xabc"), 5, 100));
        store.finish_mint(&id, true); // dialog open on the old page

        let (new_id, view) = store.mount(Some(id.as_str()), "punks", "0xother", ctx(Some("0xabc"), 0, 10));
        assert_ne!(new_id, id);
        assert!(!view.dialog_open);
        assert!(view.toast.is_none());
    }

    #[test]
    fn toast_is_consumed_on_first_mount() {
        let store = SessionStore::new();
        let (id, _) = store.mount(None, "bayc", "0xdrop", ctx(Some("0xabc"), 5, 100));
        store.begin_mint(&id, "bayc").unwrap();
        store.finish_mint(&id, true);

        let (_, first) = store.mount(Some(id.as_str()), "bayc", "0xdrop", ctx(Some("0xabc"), 6, 100));
        assert!(first.toast.is_some());
        let (_, second) = store.mount(Some(id.as_str()), "bayc", "0xdrop", ctx(Some("0xabc"), 6, 100));
        assert!(second.toast.is_none());
    }

    #[test]
    fn close_dialog_leaves_mint_state_alone() {
        let store = SessionStore::new();
        let (id, _) = store.mount(None, "bayc", "0xdrop", ctx(Some("0xabc"), 99, 100));
        store.begin_mint(&id, "bayc").unwrap();
        store.finish_mint(&id, true);
        store.close_dialog(&id);

        let (_, view) = store.mount(Some(id.as_str()), "bayc", "0xdrop", ctx(Some("0xabc"), 100, 100));
        assert!(!view.dialog_open);
        assert_eq!(view.flow.button().label, "Sold Out");
    }

    #[test]
    fn parses_session_cookie() {
        assert_eq!(
            session_id_from_cookies("gallery_session=gal-1234"),
            Some("gal-1234".into())
        );
        assert_eq!(
            session_id_from_cookies("theme=dark; gallery_session=gal-9; other=1"),
            Some("gal-9".into())
        );
        assert_eq!(session_id_from_cookies("theme=dark"), None);
        assert_eq!(session_id_from_cookies("gallery_session="), None);
    }
}
