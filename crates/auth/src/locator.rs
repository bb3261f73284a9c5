//! Credential extraction from request parameters and headers

use crate::context::CredentialSource;
use crate::entity::Entity;

/// Token and identifier presented by a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub token: Option<String>,
    pub identifier: Option<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialLocator;

impl CredentialLocator {
    /// Extract the entity's token and identifier.
    ///
    /// A parameter wins whenever its key is present, even with an empty
    /// value; the header is only consulted when the key is absent.
    pub fn locate<S>(&self, source: &S, entity: &Entity) -> Credentials
    where
        S: CredentialSource + ?Sized,
    {
        Credentials {
            token: param_or_header(source, entity.token_param_name(), entity.token_header_name()),
            identifier: param_or_header(
                source,
                entity.identifier_param_name(),
                entity.identifier_header_name(),
            ),
        }
    }
}

fn param_or_header<S>(source: &S, param: &str, header: &str) -> Option<String>
where
    S: CredentialSource + ?Sized,
{
    source
        .param(param)
        .or_else(|| source.header(header))
        .map(str::to_string)
}
