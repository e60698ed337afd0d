//! Subcommand implementations.

use std::error::Error;

use chrono::{Local, NaiveDate};
use dialoguer::{Input, Select};
use trail_map_api::TrailMapClient;
use trail_map_cli_utils::{MultiProgress, with_spinner};
use trail_map_config::AppConfig;
use trail_map_loader::{LoadSummary, load_overlays};
use trail_map_map::{HeadlessMap, MapEvent, MapView, Prompt};
use trail_map_neighbors::{NeighborError, NeighborPanel};
use trail_map_neighbors_models::{NeighborFilter, political_parties};
use trail_map_reporter::{IssueDetails, IssueReporter, parse_encountered_at};
use trail_map_spatial::distance_meters;
use trail_map_trail_models::{IssueCategory, LatLng, TrailFeature, TrailRef, format_timestamp};

use crate::prompt::TerminalPrompt;

const CANCEL_ITEM: &str = "Cancel report";

/// Shared state for every subcommand.
pub struct App {
    pub config: AppConfig,
    pub client: TrailMapClient,
    pub multi: MultiProgress,
}

impl App {
    fn map(&self) -> HeadlessMap {
        HeadlessMap::from_config(&self.config.map)
    }

    async fn loaded_map(&self) -> (HeadlessMap, LoadSummary) {
        let mut map = self.map();
        let summary = with_spinner(
            &self.multi,
            "Loading trails and issues...",
            load_overlays(&self.client, &self.client, &mut map),
        )
        .await;
        (map, summary)
    }

    /// Loads a precinct into `panel`. A missing precinct has already been
    /// reported to the user, so it yields `Ok(false)`.
    async fn load_precinct(
        &self,
        panel: &mut NeighborPanel,
        map: &mut HeadlessMap,
        precinct: &str,
    ) -> Result<bool, NeighborError> {
        let loaded = with_spinner(
            &self.multi,
            &format!("Loading precinct {precinct}..."),
            panel.show_precinct(precinct, &self.client, map, &TerminalPrompt),
        )
        .await;

        match loaded {
            Ok(_) => Ok(true),
            Err(NeighborError::PrecinctNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Prints the trail and issue overlays.
pub async fn trails(app: &App) -> Result<(), Box<dyn Error>> {
    let (map, summary) = app.loaded_map().await;

    println!("Trails: {}", summary.trails);
    for trail in map.trails() {
        println!("  {:>8}  {}", trail.trail.id, trail.trail.label);
    }

    println!();
    println!("Issues: {}", summary.issues);
    for marker in map.issues() {
        let report = &marker.report;
        println!(
            "  {:<12} {}  {}  at {}",
            report.properties.category.label(),
            format_timestamp(&report.properties.encountered_at),
            report.trail(),
            report.location
        );
        if !report.properties.details.is_empty() {
            println!("               {}", report.properties.details);
        }
    }

    Ok(())
}

/// Walks through the issue report wizard.
pub async fn report(app: &App) -> Result<(), Box<dyn Error>> {
    let (mut map, summary) = app.loaded_map().await;
    if map.trail_ids().is_empty() {
        println!("No trails available ({}), nothing to report on.", summary.trails);
        return Ok(());
    }

    let prompt = TerminalPrompt;
    let mut reporter = IssueReporter::new();
    reporter.open(&mut map);

    // Step 1: trail
    let trails: Vec<TrailRef> = map.trails().map(|t| t.trail.clone()).collect();
    let mut labels: Vec<String> = trails.iter().map(ToString::to_string).collect();
    labels.push(CANCEL_ITEM.to_string());

    while !reporter.controls().select_trail_continue {
        let idx = Select::new()
            .with_prompt("Which trail is the issue on?")
            .items(&labels)
            .default(0)
            .max_length(20)
            .interact()?;

        match trails.get(idx) {
            Some(trail) => {
                reporter.handle_event(&mut map, MapEvent::TrailClicked(trail.id))?;
            }
            None => {
                if reporter.cancel(&mut map, &prompt)? {
                    println!("Report cancelled.");
                    return Ok(());
                }
            }
        }
    }
    let Some(trail) = reporter.state().trail().cloned() else {
        return Ok(());
    };
    reporter.continue_to_point(&mut map)?;

    // Step 2: point
    let default_point = map
        .trail(trail.id)
        .and_then(trail_midpoint)
        .map(|p| format!("{}, {}", p.lat, p.lng))
        .unwrap_or_default();

    while !reporter.controls().select_point_continue {
        let input: String = Input::new()
            .with_prompt("Where is the issue? (lat, lng, or \"cancel\")")
            .default(default_point.clone())
            .validate_with(|s: &String| {
                parse_point_answer(s).map(|_| ()).ok_or_else(|| {
                    "enter a latitude and longitude like 39.95, -75.16".to_string()
                })
            })
            .interact_text()?;

        match parse_point_answer(&input) {
            Some(PointAnswer::Place(location)) => {
                for event in map.click(location) {
                    reporter.handle_event(&mut map, event)?;
                }
                if let Some(marker) = map.report_marker() {
                    println!(
                        "Snapped to {marker}, {:.0} m from the entered point",
                        distance_meters(location, marker)
                    );
                }
            }
            Some(PointAnswer::Cancel) => {
                if reporter.cancel(&mut map, &prompt)? {
                    println!("Report cancelled.");
                    return Ok(());
                }
            }
            None => {}
        }
    }
    if let Some(point) = reporter.state().point() {
        println!("Marker placed on {trail} at {point}");
    }
    reporter.continue_to_details(&mut map)?;

    // Step 3: details
    let details = prompt_details()?;

    loop {
        let action = Select::new()
            .with_prompt("Send this report?")
            .items(&["Submit", CANCEL_ITEM])
            .default(0)
            .interact()?;

        if action == 0 {
            let stored = with_spinner(
                &app.multi,
                "Submitting...",
                reporter.submit(&mut map, &app.client, details),
            )
            .await?;
            println!(
                "Reported {} on {} (id {})",
                stored.properties.category.label(),
                stored.trail(),
                stored.id.as_deref().unwrap_or("unassigned")
            );
            break;
        }

        if reporter.cancel(&mut map, &prompt)? {
            println!("Report cancelled.");
            break;
        }
    }

    Ok(())
}

fn prompt_details() -> Result<IssueDetails, Box<dyn Error>> {
    let labels: Vec<&str> = IssueCategory::ALL.iter().map(|c| c.label()).collect();
    let category = Select::new()
        .with_prompt("What kind of issue?")
        .items(&labels)
        .default(0)
        .interact()?;

    let when: String = Input::new()
        .with_prompt("When did you encounter it? (YYYY-MM-DDTHH:MM, local time)")
        .default(Local::now().format("%Y-%m-%dT%H:%M").to_string())
        .validate_with(|s: &String| {
            parse_encountered_at(s)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()?;

    let details: String = Input::new()
        .with_prompt("Details (optional)")
        .allow_empty(true)
        .interact_text()?;

    Ok(IssueDetails {
        category: IssueCategory::ALL[category],
        encountered_at: parse_encountered_at(&when)?,
        details,
    })
}

/// Prints the filtered neighbor list of a precinct.
pub async fn neighbors(
    app: &App,
    precinct: Option<String>,
    since: Option<NaiveDate>,
    party: Option<String>,
) -> Result<(), Box<dyn Error>> {
    let precinct = precinct.unwrap_or_else(|| app.config.neighbors.default_precinct.clone());
    let mut panel = NeighborPanel::from_config(&app.config.neighbors);
    panel.set_filter(NeighborFilter {
        recency: since,
        party,
    });

    let mut map = app.map();
    if app.load_precinct(&mut panel, &mut map, &precinct).await? {
        print_neighbors(&panel);
    }

    Ok(())
}

/// Geocodes one voter and prints where the marker goes.
pub async fn locate(
    app: &App,
    precinct: Option<String>,
    voter_id: &str,
) -> Result<(), Box<dyn Error>> {
    let precinct = precinct.unwrap_or_else(|| app.config.neighbors.default_precinct.clone());
    let mut panel = NeighborPanel::from_config(&app.config.neighbors);
    let mut map = app.map();

    if app.load_precinct(&mut panel, &mut map, &precinct).await? {
        locate_in(app, &mut panel, &mut map, voter_id).await?;
    }

    Ok(())
}

async fn locate_in(
    app: &App,
    panel: &mut NeighborPanel,
    map: &mut HeadlessMap,
    voter_id: &str,
) -> Result<(), Box<dyn Error>> {
    let location = with_spinner(
        &app.multi,
        "Geocoding...",
        panel.select_neighbor(voter_id, &app.client, map),
    )
    .await?;

    if let Some(item) = panel.item(voter_id) {
        println!("{} at {}", item.name, item.address);
    }
    println!("  location: {location}");
    println!(
        "  tile:     {}",
        map.tile_layer().url_at(map.center(), map.zoom())
    );

    Ok(())
}

/// Prints the party table.
pub fn parties() {
    for party in political_parties() {
        println!("  {:<4} {}", party.code, party.name);
    }
}

/// Browses neighbors interactively: pick filters, then voters to locate.
pub async fn browse_neighbors(app: &App) -> Result<(), Box<dyn Error>> {
    let precinct: String = Input::new()
        .with_prompt("Precinct")
        .default(app.config.neighbors.default_precinct.clone())
        .interact_text()?;

    let since: String = Input::new()
        .with_prompt("Voted since (YYYY-MM-DD, empty for any)")
        .allow_empty(true)
        .validate_with(|s: &String| {
            if s.trim().is_empty() {
                Ok(())
            } else {
                parse_date(s).map(|_| ())
            }
        })
        .interact_text()?;

    let mut party_labels = vec!["Any party".to_string()];
    party_labels.extend(political_parties().iter().map(|p| p.name.clone()));
    let party = Select::new()
        .with_prompt("Party")
        .items(&party_labels)
        .default(0)
        .interact()?;

    let mut panel = NeighborPanel::from_config(&app.config.neighbors);
    panel.set_filter(NeighborFilter {
        recency: parse_date(&since).ok(),
        party: party
            .checked_sub(1)
            .map(|i| political_parties()[i].code.clone()),
    });

    let mut map = app.map();
    if !app.load_precinct(&mut panel, &mut map, &precinct).await? {
        return Ok(());
    }
    print_neighbors(&panel);

    loop {
        let ids: Vec<String> = panel.visible().iter().map(|i| i.voter_id.clone()).collect();
        if ids.is_empty() {
            return Ok(());
        }

        let mut labels: Vec<String> = panel
            .visible()
            .iter()
            .map(|i| format!("{}  {}", i.name, i.address))
            .collect();
        labels.push("Done".to_string());

        let idx = Select::new()
            .with_prompt("Show a neighbor on the map")
            .items(&labels)
            .default(0)
            .max_length(20)
            .interact()?;

        let Some(voter_id) = ids.get(idx) else {
            return Ok(());
        };

        if let Err(e) = locate_in(app, &mut panel, &mut map, voter_id).await {
            TerminalPrompt.alert(&e.to_string());
        }
    }
}

fn print_neighbors(panel: &NeighborPanel) {
    println!(
        "Precinct {}: {} neighbors",
        panel.precinct().unwrap_or("-"),
        panel.count()
    );
    for item in panel.visible() {
        println!(
            "  {:<16} {:<28} {:<40} {:<16} {}",
            item.voter_id, item.name, item.address, item.party, item.last_vote
        );
    }
}

fn trail_midpoint(trail: &TrailFeature) -> Option<LatLng> {
    let line = trail.lines().next()?;
    let coord = line.0.get(line.0.len() / 2)?;
    Some(LatLng::new(coord.y, coord.x))
}

/// Answer to the point step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointAnswer {
    Place(LatLng),
    Cancel,
}

/// Parses the point step's input: `"lat, lng"` or `cancel`.
pub fn parse_point_answer(value: &str) -> Option<PointAnswer> {
    if value.trim().eq_ignore_ascii_case("cancel") {
        return Some(PointAnswer::Cancel);
    }
    parse_lat_lng(value).map(PointAnswer::Place)
}

/// Parses `"lat, lng"`.
pub fn parse_lat_lng(value: &str) -> Option<LatLng> {
    let (lat, lng) = value.split_once(',')?;
    let location = LatLng::new(lat.trim().parse().ok()?, lng.trim().parse().ok()?);
    location.is_valid().then_some(location)
}

/// Parses a `YYYY-MM-DD` date argument.
///
/// # Errors
///
/// Returns a message suitable for `clap` if the date is invalid.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
