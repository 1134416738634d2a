// File: src/services/discord/autocomplete/mod.rs
//
// Suggestion lookup for focused slash-command options. Results come from an
// operator-configured HTTP service or one of the built-in guild lookups and
// are cached per (command, option, input) for the session's cache TTL.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::trace;

use crate::Error;
use crate::cache::AutocompleteKey;
use crate::context::BotSession;
use crate::models::{AutocompleteChoice, AutocompleteConfig, ResolvedOption};

pub mod builtin;
pub mod external;

/// Platform cap on suggestions per response.
pub const MAX_CHOICES: usize = 25;
/// Platform cap on a suggestion's name and value length.
pub const MAX_CHOICE_LEN: usize = 100;

/// Earlier-filled options forwarded as filters, keyed by option name.
pub type PreviousParameters = BTreeMap<String, String>;

/// Builds the filter map from the other filled options. Empty unless the
/// focused option opts in with `usePreviousParameters`.
pub fn previous_parameters(
    config: &AutocompleteConfig,
    focused: &str,
    filled: &[ResolvedOption],
) -> PreviousParameters {
    if !config.use_previous_parameters {
        return PreviousParameters::new();
    }
    filled
        .iter()
        .filter(|opt| !opt.name.eq_ignore_ascii_case(focused))
        .filter(|opt| config.forwards(&opt.name))
        .map(|opt| (opt.name.to_lowercase(), opt.value.raw()))
        .collect()
}

/// Everything a lookup needs to know about the keystroke.
#[derive(Debug, Clone)]
pub struct SuggestionRequest<'a> {
    pub command: &'a str,
    pub option: &'a str,
    pub config: &'a AutocompleteConfig,
    pub input: &'a str,
    pub user_id: &'a str,
    pub guild_id: Option<&'a str>,
    pub previous: &'a PreviousParameters,
}

pub struct AutocompleteResolver {
    session: Arc<BotSession>,
}

impl AutocompleteResolver {
    pub fn new(session: Arc<BotSession>) -> Self {
        Self { session }
    }

    /// Cached suggestions for the request, at most `MAX_CHOICES`. Failed
    /// lookups are not cached.
    pub async fn suggestions(&self, req: &SuggestionRequest<'_>) -> Result<Vec<AutocompleteChoice>, Error> {
        let key = AutocompleteKey::new(req.command, req.option, req.input);
        if let Some(hit) = self.session.autocomplete_cache.get(&key) {
            trace!("autocomplete cache hit for /{} {}", req.command, req.option);
            return Ok(hit);
        }

        let mut choices = match req.config.external_url() {
            Some(url) => {
                external::fetch(
                    self.session.http.as_ref(),
                    url,
                    &self.session.bot_id,
                    req,
                    self.session.settings.external_autocomplete_timeout,
                )
                .await?
            }
            None => builtin::resolve(self.session.guilds.as_ref(), req),
        };
        choices.truncate(MAX_CHOICES);

        // Misses are the only writes, so expired keys are swept here.
        self.session.autocomplete_cache.purge_expired();
        self.session.autocomplete_cache.insert(key, choices.clone());
        Ok(choices)
    }
}

pub(crate) fn clip(s: &str) -> String {
    s.chars().take(MAX_CHOICE_LEN).collect()
}
