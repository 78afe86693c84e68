//! Command handlers.
//!
//! Every command runs against a short-lived session: the store is restored
//! from the snapshot slot, refreshed from the fixture source when the cache
//! says so, and written back to the slot on the way out.

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

use crate::cli::output::{detail_table, format_price, output, property_table, CommandOutput};
use crate::cli::types::{Commands, DraftArgs, ListArgs};
use crate::domain::models::{
    BasicFilter, Config, FilterCriteria, Location, PageInfo, Property, PropertyCategory,
    PropertyDraft, PropertyStats, PropertyStatus,
};
use crate::infrastructure::{FileSnapshotStore, JsonFileService};
use crate::services::{normalizer, FetchOutcome, Mutation, MutationOutcome, StoreFacade};

struct Session {
    facade: StoreFacade,
    snapshots: Option<FileSnapshotStore>,
}

impl Session {
    async fn open(config: &Config) -> Result<Self> {
        let service = JsonFileService::open(&config.fixtures.path)
            .await
            .with_context(|| format!("Failed to open fixtures at {}", config.fixtures.path))?;
        let facade = StoreFacade::new(Arc::new(service));

        let snapshots = config
            .snapshot
            .enabled
            .then(|| FileSnapshotStore::new(&config.snapshot.path));
        if let Some(snapshots) = &snapshots {
            facade.restore_snapshot(snapshots).await;
        }

        Ok(Self { facade, snapshots })
    }

    /// Refresh the listing for `criteria`, reporting rejected records.
    async fn refresh(&self, criteria: FilterCriteria, page: u64, limit: u64, force: bool) -> Result<usize> {
        match self.facade.fetch_list(criteria, page, limit, force).await? {
            FetchOutcome::Fetched { report, .. } => {
                for rejection in &report.rejected {
                    tracing::warn!(index = rejection.index, error = %rejection.error, "record skipped");
                }
                Ok(report.rejected.len())
            }
            FetchOutcome::Skipped | FetchOutcome::Superseded => Ok(0),
        }
    }

    /// Persist the store; a failed save is logged, never fatal.
    async fn close(self) {
        if let Some(snapshots) = &self.snapshots {
            if let Err(err) = self.facade.save_snapshot(snapshots).await {
                tracing::warn!(error = %err, path = %snapshots.path().display(), "failed to save snapshot");
            }
        }
    }
}

/// Run one command to completion.
pub async fn execute(command: Commands, config: &Config, json: bool) -> Result<()> {
    if let Commands::Validate { path } = &command {
        return validate(path, json).await;
    }

    let session = Session::open(config).await?;
    let result = run(&session, command, config, json).await;
    session.close().await;
    result
}

async fn run(session: &Session, command: Commands, config: &Config, json: bool) -> Result<()> {
    let facade = &session.facade;

    match command {
        Commands::List(args) => {
            let criteria = list_criteria(&args)?;
            let limit = args.limit.unwrap_or(config.pagination.default_limit);
            let rejected = session.refresh(criteria.clone(), args.page, limit, args.refresh).await?;
            facade.set_filters(criteria);

            let page = facade.select_page(args.page, limit);
            output(
                &ListOutput {
                    properties: page.items,
                    page: page.info,
                    rejected,
                },
                json,
            );
        }
        Commands::Show { id } => {
            match facade.execute(Mutation::FetchById { id }).await? {
                MutationOutcome::Fetched(property) => output(&DetailOutput { property }, json),
                other => bail!("unexpected outcome for fetch: {}", other.property_id()),
            }
        }
        Commands::Stats { refresh } => {
            let criteria = facade.current_criteria();
            session
                .refresh(criteria, 1, config.pagination.default_limit, refresh)
                .await?;
            output(&StatsOutput(facade.select_stats()), json);
        }
        Commands::Create(args) => {
            let draft = draft_from(&args)?;
            let outcome = facade.execute(Mutation::Create { draft }).await?;
            output(&MutationOutput::from_outcome("created", &outcome), json);
        }
        Commands::Update { id, draft } => {
            let draft = draft_from(&draft)?;
            session
                .refresh(facade.current_criteria(), 1, config.pagination.default_limit, false)
                .await?;
            let outcome = facade.execute(Mutation::Update { id, draft }).await?;
            output(&MutationOutput::from_outcome("updated", &outcome), json);
        }
        Commands::Delete { id } => {
            session
                .refresh(facade.current_criteria(), 1, config.pagination.default_limit, false)
                .await?;
            let outcome = facade.execute(Mutation::Delete { id }).await?;
            output(&MutationOutput::from_outcome("deleted", &outcome), json);
        }
        Commands::Validate { path } => validate(&path, json).await?,
    }

    Ok(())
}

fn list_criteria(args: &ListArgs) -> Result<FilterCriteria> {
    let basic = BasicFilter::from_str(&args.filter)
        .ok_or_else(|| anyhow!("Invalid filter: {}. Must be one of: all, available, expensive", args.filter))?;
    let mut criteria = FilterCriteria::default()
        .with_price_range(args.min_price, args.max_price)
        .with_basic(basic);

    if let Some(search) = &args.search {
        criteria = criteria.with_search(search.clone());
    }
    if let Some(category) = &args.category {
        criteria = criteria.with_category(parse_category(category)?);
    }
    Ok(criteria)
}

fn parse_category(value: &str) -> Result<PropertyCategory> {
    PropertyCategory::from_str(value).ok_or_else(|| {
        anyhow!("Invalid category: {value}. Must be one of: apartment, house, commercial, land")
    })
}

fn draft_from(args: &DraftArgs) -> Result<PropertyDraft> {
    let status = PropertyStatus::from_str(&args.status)
        .ok_or_else(|| anyhow!("Invalid status: {}. Must be one of: available, sold, rented", args.status))?;

    let mut draft = PropertyDraft::new(args.name.clone(), args.price)
        .with_category(parse_category(&args.category)?)
        .with_status(status);
    if let Some(location) = &args.location {
        draft.location = Location::Text(location.clone());
    }
    if let Some(description) = &args.description {
        draft.description.clone_from(description);
    }
    Ok(draft)
}

async fn validate(path: &Path, json: bool) -> Result<()> {
    let payload = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let records = match serde_json::from_str::<Value>(&payload)
        .with_context(|| format!("{} is not valid JSON", path.display()))?
    {
        Value::Array(records) => records,
        other => vec![other],
    };

    let reports = records
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            let shape = normalizer::classify(raw).as_str();
            match normalizer::normalize(raw).and_then(|property| property.validate().map(|()| property)) {
                Ok(property) => RecordReport {
                    index,
                    shape,
                    id: Some(property.id),
                    error: None,
                },
                Err(err) => RecordReport {
                    index,
                    shape,
                    id: normalizer::record_id(raw),
                    error: Some(err.to_string()),
                },
            }
        })
        .collect();

    output(&ValidateOutput { records: reports }, json);
    Ok(())
}

#[derive(Debug, Serialize)]
struct ListOutput {
    properties: Vec<Property>,
    page: PageInfo,
    rejected: usize,
}

impl CommandOutput for ListOutput {
    fn to_human(&self) -> String {
        if self.properties.is_empty() {
            return format!(
                "No properties on page {} ({} match).",
                self.page.page, self.page.total
            );
        }

        let mut lines = vec![property_table(&self.properties)];
        lines.push(format!(
            "Page {} of {} ({} match)",
            self.page.page, self.page.total_pages, self.page.total
        ));
        if self.rejected > 0 {
            lines.push(format!("{} record(s) skipped as malformed or invalid", self.rejected));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
struct DetailOutput {
    property: Property,
}

impl CommandOutput for DetailOutput {
    fn to_human(&self) -> String {
        let property = &self.property;
        let mut rows = vec![
            ("ID", property.id.clone()),
            ("Name", property.name.clone()),
            ("Price", format_price(property.price, &property.currency)),
            ("Category", property.category.to_string()),
            ("Status", property.status.to_string()),
            ("Location", property.location.to_string()),
            ("Area", format!("{} {}", property.area, property.area_unit.as_str())),
            ("Images", format!("{} enabled", property.enabled_images().count())),
            ("Updated", property.updated_at.to_rfc3339()),
        ];
        if !property.description.is_empty() {
            rows.push(("Description", property.description.clone()));
        }
        if let Some(owner) = &property.owner {
            rows.push(("Owner", owner.name.clone()));
        }
        if !property.traces.is_empty() {
            rows.push(("Sales", property.traces.len().to_string()));
        }
        detail_table(&rows)
    }
}

#[derive(Debug, Serialize)]
struct StatsOutput(PropertyStats);

impl CommandOutput for StatsOutput {
    fn to_human(&self) -> String {
        let stats = &self.0;
        let price = |value: Option<f64>| value.map_or_else(|| "-".to_string(), |value| format_price(value, "USD"));
        detail_table(&[
            ("Listed", stats.count.to_string()),
            ("Available", stats.available_count.to_string()),
            ("Expensive", stats.expensive_count.to_string()),
            ("Min price", price(stats.min_price)),
            ("Avg price", price(stats.avg_price)),
            ("Max price", price(stats.max_price)),
        ])
    }
}

#[derive(Debug, Serialize)]
struct MutationOutput {
    action: &'static str,
    id: String,
}

impl MutationOutput {
    fn from_outcome(action: &'static str, outcome: &MutationOutcome) -> Self {
        Self {
            action,
            id: outcome.property_id().to_string(),
        }
    }
}

impl CommandOutput for MutationOutput {
    fn to_human(&self) -> String {
        format!("Property {} {}", self.id, self.action)
    }
}

#[derive(Debug, Serialize)]
struct RecordReport {
    index: usize,
    shape: &'static str,
    id: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct ValidateOutput {
    records: Vec<RecordReport>,
}

impl CommandOutput for ValidateOutput {
    fn to_human(&self) -> String {
        let rejected: Vec<&RecordReport> = self.records.iter().filter(|r| r.error.is_some()).collect();
        let mut lines = vec![format!(
            "{} record(s), {} accepted, {} rejected",
            self.records.len(),
            self.records.len() - rejected.len(),
            rejected.len()
        )];
        for report in rejected {
            lines.push(format!(
                "  #{} [{}] {}: {}",
                report.index,
                report.shape,
                report.id.as_deref().unwrap_or("-"),
                report.error.as_deref().unwrap_or_default()
            ));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_criteria_parses_filters() {
        let args = ListArgs {
            search: Some("loft".to_string()),
            min_price: Some(100.0),
            category: Some("Apartment".to_string()),
            filter: "expensive".to_string(),
            page: 1,
            ..ListArgs::default()
        };

        let criteria = list_criteria(&args).unwrap();
        assert_eq!(criteria.search_term(), Some("loft"));
        assert_eq!(criteria.min_price, Some(100.0));
        assert_eq!(criteria.category, Some(PropertyCategory::Apartment));
        assert_eq!(criteria.basic, BasicFilter::Expensive);
    }

    #[test]
    fn test_list_criteria_rejects_unknown_filter() {
        let args = ListArgs {
            filter: "cheap".to_string(),
            ..ListArgs::default()
        };
        assert!(list_criteria(&args).is_err());
    }

    #[test]
    fn test_draft_from_args() {
        let args = DraftArgs {
            name: "Casa Azul".to_string(),
            price: 320_000.0,
            location: Some("Calle 5, Cali".to_string()),
            category: "house".to_string(),
            status: "rented".to_string(),
            description: None,
        };

        let draft = draft_from(&args).unwrap();
        assert_eq!(draft.status, PropertyStatus::Rented);
        assert_eq!(draft.location, Location::Text("Calle 5, Cali".to_string()));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn test_validate_output_counts() {
        let output = ValidateOutput {
            records: vec![
                RecordReport { index: 0, shape: "generic", id: Some("a".to_string()), error: None },
                RecordReport {
                    index: 1,
                    shape: "generic",
                    id: None,
                    error: Some("Malformed record: no id".to_string()),
                },
            ],
        };
        let text = output.to_human();
        assert!(text.starts_with("2 record(s), 1 accepted, 1 rejected"));
        assert!(text.contains("#1 [generic] -: Malformed record: no id"));
    }
}
