//! Projection of the source of truth into a flat descriptor.

use {
    chrono::{DateTime, Local, SecondsFormat},
    marketsmith_config::{ProjectorConfig, SourceOfTruth},
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::{
    error::{Error, Result},
    types::{GENERATED_AT_KEY, MarketplaceDescriptor, Owner, PluginDescriptor, PluginSource},
};

/// Render a timestamp the way every pass writes it into metadata.
pub fn format_timestamp(now: DateTime<Local>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Project the record under `settings.marketplace_key` into one flat
/// descriptor with one plugin per source plugin record, in source order.
pub fn project(
    source: &SourceOfTruth,
    settings: &ProjectorConfig,
    now: DateTime<Local>,
) -> Result<MarketplaceDescriptor> {
    let key = &settings.marketplace_key;
    let Some(record) = source.marketplaces.get(key) else {
        return Err(Error::malformed("source of truth", vec![format!(
            "`marketplaces.{key}`: missing required key"
        )]));
    };

    let handle = &source.owner.github;
    let owner_base = format!("{}/{handle}", settings.platform_base_url.trim_end_matches('/'));

    let repository = if settings.repo_placeholder.is_empty() {
        record.github_repo.clone()
    } else {
        record
            .github_repo
            .replace(&settings.repo_placeholder, &format!("{owner_base}/"))
    };

    let owner = Owner {
        name: source.owner.name.clone(),
        github: Some(handle.clone()),
        repository: Some(repository),
        note: settings.owner_note.clone(),
        extra: Map::new(),
    };

    let plugins = record
        .plugins
        .iter()
        .map(|p| {
            let mut keywords = vec![p.kind.clone()];
            if p.category != p.kind {
                keywords.push(p.category.clone());
            }
            debug!(plugin = %p.name, kind = %p.kind, "projecting plugin");
            PluginDescriptor {
                description: p.description.clone(),
                version: Some(record.version.clone()),
                category: Some(p.category.clone()),
                keywords,
                strict: Some(settings.strict),
                ..PluginDescriptor::new(&p.name, PluginSource::bare(format!("./plugins/{}", p.name)))
            }
        })
        .collect();

    let homepage = format!("{owner_base}/{}", settings.homepage_repo);
    let mut metadata = Map::new();
    metadata.insert("homepage".into(), Value::from(homepage.clone()));
    metadata.insert("documentation".into(), Value::from(format!("{homepage}/blob/main/README.md")));
    metadata.insert("license".into(), Value::from(settings.license.clone()));
    metadata.insert("keywords".into(), Value::from(settings.keywords.clone()));
    metadata.insert(GENERATED_AT_KEY.into(), Value::from(format_timestamp(now)));
    metadata.insert("structure".into(), Value::from(settings.structure.clone()));
    metadata.insert("note".into(), Value::from(settings.note.clone()));
    metadata.insert("generated_from".into(), Value::from(settings.generated_from.clone()));

    Ok(MarketplaceDescriptor {
        name: record.name.clone(),
        version: record.version.clone(),
        owner,
        description: record.description.clone(),
        plugins,
        metadata,
    })
}
