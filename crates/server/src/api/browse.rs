use std::time::Instant;

use axum::extract::{Query, State};
use axum::Json;
use common::{BrowseOptions, BrowseType};
use library::parse_browse_type;
use tracing::info;

use crate::state::{AppState, BrowseQuery, BrowseResponse, JsonResult, MediaResponse};
use crate::utils::library_json_error;

pub async fn browse(
    State(state): State<AppState>,
    Query(params): Query<BrowseQuery>,
) -> JsonResult<BrowseResponse> {
    let opts = browse_options(&params)?;
    let key = params.key.as_deref().unwrap_or("");
    info!(
        "browse key={:?} browse_type={} search={:?}",
        key, opts.browse_type, opts.text_filter
    );

    let started = Instant::now();
    let mut items = state.library.browse(key, &opts).map_err(library_json_error)?;
    if params.reverse.unwrap_or(false) {
        items.reverse();
    }
    info!(
        "found {} items in {} µs",
        items.len(),
        started.elapsed().as_micros()
    );
    Ok(Json(BrowseResponse { items }))
}

pub async fn media(
    State(state): State<AppState>,
    Query(params): Query<BrowseQuery>,
) -> JsonResult<MediaResponse> {
    let opts = browse_options(&params)?;
    let key = params.key.as_deref().unwrap_or("");
    info!(
        "media key={:?} browse_type={} search={:?}",
        key, opts.browse_type, opts.text_filter
    );

    let started = Instant::now();
    let mut keys = state.library.media(key, &opts).map_err(library_json_error)?;
    if params.reverse.unwrap_or(false) {
        keys.reverse();
    }
    info!(
        "found {} items in {} µs",
        keys.len(),
        started.elapsed().as_micros()
    );
    Ok(Json(MediaResponse { keys }))
}

fn browse_options(
    params: &BrowseQuery,
) -> Result<BrowseOptions, (axum::http::StatusCode, Json<crate::state::ErrorResponse>)> {
    let browse_type = match params.browse_type.as_deref().map(str::trim) {
        None | Some("") => BrowseType::default(),
        Some(value) => parse_browse_type(value).map_err(library_json_error)?,
    };
    Ok(BrowseOptions::new(
        browse_type,
        params.search.clone().unwrap_or_default(),
    ))
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use library::ReloadableLibrary;
    use tokio_util::sync::CancellationToken;

    use super::{browse, media};
    use crate::config::ServerConfig;
    use crate::state::{AppState, BrowseQuery};

    fn state_for(root: &Path) -> AppState {
        AppState::new(
            ReloadableLibrary::new(vec![root.to_path_buf()]),
            ServerConfig::default(),
            CancellationToken::new(),
        )
    }

    fn query(key: &str, search: &str, browse_type: Option<&str>, reverse: bool) -> BrowseQuery {
        BrowseQuery {
            key: Some(key.to_string()),
            search: Some(search.to_string()),
            browse_type: browse_type.map(str::to_string),
            reverse: Some(reverse),
        }
    }

    fn loaded_state(dir: &Path) -> AppState {
        for name in ["a/01.mp3", "b/02.mp3", "c/03.mp3"] {
            let path = dir.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"noise").unwrap();
        }
        let state = state_for(dir);
        state.library.load(&CancellationToken::new()).unwrap();
        state
    }

    #[tokio::test]
    async fn browse_before_load_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_for(dir.path());
        let err = browse(State(state), Query(BrowseQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn browse_reverses_on_request() {
        let dir = tempfile::tempdir().unwrap();
        let state = loaded_state(dir.path());

        let roots = browse(State(state.clone()), Query(BrowseQuery::default()))
            .await
            .unwrap();
        let root_key = roots.0.items[0].key.clone();

        let forward = browse(State(state.clone()), Query(query(&root_key, "", None, false)))
            .await
            .unwrap();
        let names: Vec<String> = forward.0.items.iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);

        let reversed = browse(State(state), Query(query(&root_key, "", Some("file"), true)))
            .await
            .unwrap();
        let names: Vec<String> = reversed.0.items.iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[tokio::test]
    async fn unknown_browse_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = loaded_state(dir.path());
        let err = browse(State(state), Query(query("", "", Some("mood"), false)))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1 .0.error, "unsupported browse type: mood");
    }

    #[tokio::test]
    async fn media_requires_key_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let state = loaded_state(dir.path());

        let err = media(State(state.clone()), Query(BrowseQuery::default()))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let roots = browse(State(state.clone()), Query(BrowseQuery::default()))
            .await
            .unwrap();
        let root_key = roots.0.items[0].key.clone();
        let all = media(State(state.clone()), Query(query(&root_key, "", None, false)))
            .await
            .unwrap();
        assert_eq!(all.0.keys.len(), 3);

        let filtered = media(State(state), Query(query(&root_key, "02.mp3", None, false)))
            .await
            .unwrap();
        assert_eq!(filtered.0.keys.len(), 1);
        assert!(filtered.0.keys[0].ends_with("/b/02.mp3"));
    }
}
