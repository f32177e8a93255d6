use std::borrow::Cow;

use url::Url;

use super::{
    authentication::Credentials, error, extension::ClientId, Error, SmtpTransportBuilder,
    SMTP_PORT,
};

/// Create a new `SmtpTransportBuilder` from a connection URL
pub(crate) fn from_connection_url(connection_url: &str) -> Result<SmtpTransportBuilder, Error> {
    let connection_url = Url::parse(connection_url).map_err(error::configuration)?;
    let tls: Option<String> = connection_url
        .query_pairs()
        .find(|(k, _)| k == "tls")
        .map(|(_, v)| v.to_string());

    let host = connection_url
        .host_str()
        .ok_or_else(|| error::configuration("smtp host undefined"))?;

    let mut builder = SmtpTransportBuilder::new(host);

    match (connection_url.scheme(), tls.as_deref()) {
        ("smtp", None) => {
            builder = builder.port(connection_url.port().unwrap_or(SMTP_PORT));
        }
        (scheme, tls) => {
            return Err(error::configuration(format!(
                "Unknown scheme '{scheme}' or tls parameter '{tls:?}', only plain smtp is supported"
            )))
        }
    }

    // use the path segment of the URL as name in the HELO / EHLO command
    if connection_url.path().len() > 1 {
        let name = connection_url.path().trim_matches('/').to_owned();
        builder = builder.hello_name(ClientId::Domain(name));
    }

    if let Some(password) = connection_url.password() {
        let percent_decode = |s: &str| {
            percent_encoding::percent_decode_str(s)
                .decode_utf8()
                .map(Cow::into_owned)
                .map_err(error::configuration)
        };
        let credentials = Credentials::new(
            percent_decode(connection_url.username())?,
            percent_decode(password)?,
        );
        builder = builder.credentials(credentials);
    }

    Ok(builder)
}
