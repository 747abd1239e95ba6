//! Path and URL helpers shared by both bridge directions.

use url::Url;

use crate::error::BridgeError;

/// Query marker telling the embedded application to hide its own menu.
pub const HIDE_MENU_PARAM: &str = "hideMenu";

/// Computes the child-frame document URL for a host path.
///
/// The path is resolved against `base` and `hideMenu` is set to an empty
/// value, replacing any `hideMenu` pair already present.
pub fn child_url(base: &Url, path: &str) -> Result<Url, BridgeError> {
	let mut url = base.join(path).map_err(|err| BridgeError::InvalidPath {
		path: path.to_string(),
		reason: err.to_string(),
	})?;

	let retained: Vec<(String, String)> = url
		.query_pairs()
		.filter(|(key, _)| key != HIDE_MENU_PARAM)
		.map(|(key, value)| (key.into_owned(), value.into_owned()))
		.collect();

	url.query_pairs_mut().clear().extend_pairs(retained).append_pair(HIDE_MENU_PARAM, "");
	Ok(url)
}

/// Removes a leading locale segment (`/en/...`) when it names one of `locales`.
///
/// Only whole segments match: `/entities` keeps its path.
pub fn strip_locale<'a>(path: &'a str, locales: &[String]) -> &'a str {
	let Some(rest) = path.strip_prefix('/') else {
		return path;
	};
	let segment = rest.split('/').next().unwrap_or_default();
	if !locales.iter().any(|locale| locale == segment) {
		return path;
	}

	match &rest[segment.len()..] {
		"" => "/",
		tail => tail,
	}
}

/// Extracts the host path that corresponds to an embedded application URL.
///
/// Returns `None` when `href` is not an absolute URL.
pub fn host_path_for(href: &str, locales: &[String]) -> Option<String> {
	let url = Url::parse(href).ok()?;
	Some(strip_locale(url.path(), locales).to_string())
}
