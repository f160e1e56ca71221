//! Redirect policies for the modern client.

use reqwest::redirect::Policy;
use serde::{Deserialize, Serialize};
use url::Url;

/// Whether, and where, the client follows `3xx` responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Redirect {
    /// Never follow; the `3xx` response is returned as-is.
    #[default]
    Never,
    /// Always follow.
    Always,
    /// Follow, except from an `https` URL to an `http` one.
    Normal,
}

impl Redirect {
    /// Returns whether a redirect from `from` to `to` is followed.
    pub fn allows(self, from: &Url, to: &Url) -> bool {
        match self {
            Redirect::Never => false,
            Redirect::Always => true,
            Redirect::Normal => !(from.scheme() == "https" && to.scheme() == "http"),
        }
    }

    /// Builds the reqwest policy for this setting.
    ///
    /// More than `max_redirects` hops in one exchange fails the exchange with
    /// a redirect error. A hop this setting refuses stops the chain and hands
    /// the `3xx` response back to the caller.
    pub(crate) fn to_policy(self, max_redirects: usize) -> Policy {
        if self == Redirect::Never {
            return Policy::none();
        }

        Policy::custom(move |attempt| {
            let hops = attempt.previous().len();
            let allowed = attempt
                .previous()
                .last()
                .map_or(true, |from| self.allows(from, attempt.url()));

            if hops > max_redirects {
                attempt.error(format!("too many redirects (limit {})", max_redirects))
            } else if allowed {
                attempt.follow()
            } else {
                log::debug!("not following redirect to {}", attempt.url());
                attempt.stop()
            }
        })
    }
}
