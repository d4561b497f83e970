use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use swap_booking::{BookingWizard, SlotPicker, SlotState, SlotToggle, SubmitOutcome, WizardContext};
use swap_catalog::{SlotStats, StationSelector};
use swap_client::{ApiClient, Config, HttpBookingApi, NominatimGeocoder, OsrmDirections};
use swap_core::directions::DirectionsProvider;
use swap_core::geocoding::Geocoder;
use swap_core::repository::{BookingApi, StationApi};
use swap_core::search::MAX_PAGE_SIZE;
use swap_core::session::{AppRoute, Notifier, SessionContext};
use swap_core::{ListQuery, Vehicle};
use swap_shared::Masked;
use tracing::info;

use crate::cli::{BookArgs, CabinetArgs, Command, DirectionsArgs, LocationArgs, PageArgs, StationsArgs};
use crate::console::{ConsoleNavigator, ConsoleNotifier};

/// The backends a command talks to.
#[derive(Clone)]
pub struct Services {
    pub bookings: Arc<dyn BookingApi>,
    pub stations: Arc<dyn StationApi>,
    pub geocoder: Arc<dyn Geocoder>,
    pub directions: Arc<dyn DirectionsProvider>,
    pub notifier: Arc<dyn Notifier>,
}

impl Services {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let session = config
            .api
            .access_token
            .as_deref()
            .map(SessionContext::with_token)
            .unwrap_or_default();
        if !session.is_authenticated() {
            info!("No access token configured, calling the backend anonymously");
        }

        let api = Arc::new(HttpBookingApi::new(ApiClient::new(&config.api, session)?));
        let timeout = Duration::from_secs(config.api.timeout_seconds);

        Ok(Self {
            bookings: api.clone(),
            stations: api,
            geocoder: Arc::new(NominatimGeocoder::new(&config.geocoding, timeout)?),
            directions: Arc::new(OsrmDirections::new(&config.directions, timeout)?),
            notifier: Arc::new(ConsoleNotifier),
        })
    }

    fn wizard(&self, navigator: Arc<ConsoleNavigator>) -> BookingWizard {
        BookingWizard::open(WizardContext {
            bookings: self.bookings.clone(),
            stations: self.stations.clone(),
            geocoder: self.geocoder.clone(),
            notifier: self.notifier.clone(),
            navigator,
        })
    }
}

pub async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let mut out = std::io::stdout();
    if let Command::Check = command {
        return check(&config, &mut out);
    }
    let services = Services::from_config(&config)?;
    execute(&services, command, &mut out).await
}

pub async fn execute<W: Write>(services: &Services, command: Command, out: &mut W) -> anyhow::Result<()> {
    match command {
        Command::Vehicles => vehicles(services, out).await,
        Command::Stations(args) => stations(services, &args, out).await,
        Command::Cabinet(args) => cabinet(services, &args, out).await,
        Command::Book(args) => {
            let navigator = Arc::new(ConsoleNavigator::default());
            book(services, navigator.clone(), &args, out).await?;
            if navigator.last() == Some(AppRoute::BookingHistory) {
                writeln!(out)?;
                history(services, &PageArgs { page: 1, limit: 5 }, out).await?;
            }
            Ok(())
        }
        Command::History(args) => history(services, &args, out).await,
        Command::Directions(args) => directions(services, &args, out).await,
        // Needs no backend; answered by `run`
        Command::Check => Ok(()),
    }
}

pub fn check<W: Write>(config: &Config, out: &mut W) -> anyhow::Result<()> {
    let token = config.api.access_token.clone().map(Masked::new);
    writeln!(out, "Configuration is valid")?;
    writeln!(out, "  Backend     : {} (timeout {}s)", config.api.base_url, config.api.timeout_seconds)?;
    writeln!(out, "  Token       : {}", token.map_or("none".to_string(), |t| t.to_string()))?;
    writeln!(out, "  Geocoder    : {} [{}]", config.geocoding.base_url, config.geocoding.country_codes)?;
    writeln!(out, "  Directions  : {} ({})", config.directions.base_url, config.directions.profile)?;
    writeln!(out, "  Log level   : {}", config.logging.level)?;
    Ok(())
}

fn battery_label(vehicle: &Vehicle) -> String {
    match (vehicle.battery_type_name(), vehicle.battery_type_id()) {
        (Some(name), _) => name.to_string(),
        (None, Some(id)) => format!("#{}", id),
        (None, None) => "unassigned".to_string(),
    }
}

async fn vehicles<W: Write>(services: &Services, out: &mut W) -> anyhow::Result<()> {
    let vehicles = services
        .bookings
        .get_user_vehicles()
        .await
        .context("Failed to load vehicles")?;
    if vehicles.is_empty() {
        writeln!(out, "No vehicles registered")?;
        return Ok(());
    }
    for vehicle in &vehicles {
        writeln!(
            out,
            "{:>6}  {:<24} {:<14} battery {}",
            vehicle.id,
            vehicle.name,
            vehicle.license_plate.as_deref().unwrap_or("-"),
            battery_label(vehicle)
        )?;
    }
    Ok(())
}

async fn stations<W: Write>(services: &Services, args: &StationsArgs, out: &mut W) -> anyhow::Result<()> {
    let mut query = ListQuery::new(args.paging.page, args.paging.limit);
    if let Some(search) = &args.search {
        query = query.with_search(search.clone());
    }
    if let Some(status) = &args.status {
        query = query.with_filter("status", status.clone());
    }

    let Some(from) = args.near else {
        let page = services.stations.list_stations(&query).await.context("Failed to load stations")?;
        for station in &page.items {
            writeln!(out, "{:>6}  {:<28} {}", station.id, station.name, station.address.as_deref().unwrap_or("-"))?;
        }
        writeln!(out, "page {}/{} ({} stations)", page.page, page.total_pages(), page.total)?;
        return Ok(());
    };

    let selector = StationSelector::load(services.stations.as_ref(), query).await?;
    for nearby in selector.by_distance(from) {
        writeln!(
            out,
            "{:>6}  {:<28} {:>6.1} km",
            nearby.station.id, nearby.station.name, nearby.distance_km
        )?;
    }
    Ok(())
}

async fn cabinet<W: Write>(services: &Services, args: &CabinetArgs, out: &mut W) -> anyhow::Result<()> {
    let cabinets = services
        .stations
        .get_cabinets_by_station_and_battery_type(args.station_id, args.battery_type)
        .await
        .context("Failed to load cabinets")?;
    if cabinets.is_empty() {
        writeln!(out, "No cabinet at station {} holds battery type {}", args.station_id, args.battery_type)?;
        return Ok(());
    }

    // The list may be stale; slots come from the per-cabinet endpoint
    let mut live = Vec::with_capacity(cabinets.len());
    for cabinet in &cabinets {
        live.push(services.stations.get_cabinet_by_id(cabinet.id).await?);
    }

    for cabinet in &live {
        let stats = SlotStats::from_slots(&cabinet.slots);
        writeln!(out, "Cabinet {} {} ({}/{} available)", cabinet.id, cabinet.name, stats.available, stats.total)?;
        for slot in &cabinet.slots {
            let charge = slot
                .battery
                .as_ref()
                .and_then(|b| b.charge_level)
                .map_or(String::new(), |level| format!(" {:.0}%", level));
            writeln!(
                out,
                "  slot {:>4} {:<8} {:<12} battery {}{}",
                slot.id,
                slot.name,
                format!("{:?}", slot.status),
                slot.battery_id.map_or("-".to_string(), |id| id.to_string()),
                charge
            )?;
        }
    }

    let totals = SlotStats::from_cabinets(&live);
    writeln!(
        out,
        "{} selectable of {} slots ({:.0}% available)",
        totals.selectable,
        totals.total,
        totals.availability() * 100.0
    )?;
    Ok(())
}

async fn apply_location(wizard: &mut BookingWizard, location: &LocationArgs) -> bool {
    match (location.at, &location.address) {
        (Some(at), _) => {
            wizard.pick_location(at).await;
            true
        }
        (None, Some(address)) => {
            wizard.set_address(address.clone());
            wizard.resolve_address().await
        }
        (None, None) => false,
    }
}

async fn book<W: Write>(
    services: &Services,
    navigator: Arc<ConsoleNavigator>,
    args: &BookArgs,
    out: &mut W,
) -> anyhow::Result<()> {
    let mut wizard = services.wizard(navigator);
    wizard.load_vehicles().await?;
    wizard.load_stations(ListQuery::new(1, MAX_PAGE_SIZE)).await?;
    wizard.select_vehicle(args.vehicle)?;
    wizard.select_station(args.station)?;
    apply_location(&mut wizard, &args.location).await;

    writeln!(out, "{}", wizard.form().compatibility().message)?;
    if !wizard.continue_to_slots() {
        let reasons: Vec<String> = wizard.step1_blockers().iter().map(ToString::to_string).collect();
        bail!("Cannot continue: {}", reasons.join(", "));
    }

    wizard.load_cabinets().await?;
    if let Some(cabinet_id) = args.cabinet {
        if !wizard.picker().cabinets().iter().any(|c| c.id == cabinet_id) {
            bail!("Cabinet {} does not serve this station and battery type", cabinet_id);
        }
        wizard.open_cabinet(cabinet_id).await?;
    }

    if args.slots.is_empty() {
        if let Some(cabinet) = wizard.picker().open() {
            writeln!(out, "Cabinet {} {}:", cabinet.id, cabinet.name)?;
            for slot in &cabinet.slots {
                if SlotPicker::slot_state(slot, wizard.draft()) == SlotState::Available {
                    writeln!(out, "  slot {} battery {}", slot.id, slot.battery_id.unwrap_or_default())?;
                }
            }
        }
        bail!("Choose at least one slot with --slot");
    }

    for &slot_id in &args.slots {
        match wizard.toggle_slot(slot_id) {
            SlotToggle::Selected { battery_id } => writeln!(out, "Slot {} -> battery {}", slot_id, battery_id)?,
            SlotToggle::Deselected { battery_id } => writeln!(out, "Slot {} released battery {}", slot_id, battery_id)?,
            SlotToggle::Ignored => writeln!(out, "Slot {} is not available", slot_id)?,
            SlotToggle::UnknownSlot => writeln!(out, "Slot {} is not in the open cabinet", slot_id)?,
            // Already reported through the notifier
            SlotToggle::LimitReached | SlotToggle::IncompatibleBattery => {}
        }
    }

    match wizard.submit().await {
        SubmitOutcome::Submitted { booking, event } => {
            let id = booking.map_or("?".to_string(), |b| b.id.to_string());
            writeln!(out, "Booking #{} created for batteries {:?}", id, event.battery_ids)?;
            Ok(())
        }
        SubmitOutcome::Rejected { message } => Err(anyhow!(message)),
        SubmitOutcome::NotReady => bail!("No battery selected"),
    }
}

async fn history<W: Write>(services: &Services, args: &PageArgs, out: &mut W) -> anyhow::Result<()> {
    let page = services
        .bookings
        .list_my_bookings(&ListQuery::new(args.page, args.limit))
        .await
        .context("Failed to load booking history")?;
    if page.items.is_empty() {
        writeln!(out, "No bookings yet")?;
        return Ok(());
    }
    for booking in &page.items {
        let batteries: Vec<i64> = booking.booking_details.iter().map(|d| d.battery_id).collect();
        writeln!(
            out,
            "#{:<6} {:<10} station {:<6} batteries {:?} {}",
            booking.id,
            format!("{:?}", booking.status),
            booking.station_id.map_or("-".to_string(), |id| id.to_string()),
            batteries,
            booking.created_at.map(|t| t.format("%Y-%m-%d %H:%M").to_string()).unwrap_or_default()
        )?;
    }
    writeln!(out, "page {}/{} ({} bookings)", page.page, page.total_pages(), page.total)?;
    Ok(())
}

async fn directions<W: Write>(services: &Services, args: &DirectionsArgs, out: &mut W) -> anyhow::Result<()> {
    let station = services
        .stations
        .get_station_by_id(args.station_id)
        .await
        .context("Failed to load station")?;
    let name = station.name.clone();

    let mut wizard = services.wizard(Arc::new(ConsoleNavigator::default()));
    wizard.set_stations(vec![station])?;
    wizard.select_station(args.station_id)?;
    if !apply_location(&mut wizard, &args.location).await && wizard.user_location().is_none() {
        bail!("Could not resolve the starting location");
    }

    let route = wizard.route_to_station(services.directions.as_ref()).await?;
    writeln!(
        out,
        "To {}: {:.1} km, about {:.0} min",
        name,
        route.distance_km(),
        route.duration_minutes()
    )?;
    for step in &route.steps {
        writeln!(out, "  {:>7.0} m  {}", step.distance_m, step.instruction)?;
    }
    Ok(())
}
