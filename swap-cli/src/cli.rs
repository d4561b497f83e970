use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use swap_core::Coordinates;

/// Battery swap booking client.
#[derive(Parser, Debug)]
#[command(name = "swap", version, about = "Book battery swaps at charging stations")]
pub struct Cli {
    /// Extra configuration file (TOML), layered over config/default and config/{RUN_MODE}.
    #[arg(short, long, env = "SWAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Access token of the signed-in user.
    #[arg(long, env = "SWAP_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the signed-in user's vehicles
    Vehicles,
    /// List swap stations
    Stations(StationsArgs),
    /// Show the cabinets and slots of a station for one battery type
    Cabinet(CabinetArgs),
    /// Book a battery swap
    Book(BookArgs),
    /// Show past bookings
    History(PageArgs),
    /// Driving directions to a station
    Directions(DirectionsArgs),
    /// Validate the configuration and exit
    Check,
}

#[derive(Args, Debug, Clone)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long, default_value_t = swap_core::search::DEFAULT_PAGE_SIZE)]
    pub limit: u32,
}

#[derive(Args, Debug)]
pub struct StationsArgs {
    #[command(flatten)]
    pub paging: PageArgs,

    /// Name or address contains
    #[arg(long)]
    pub search: Option<String>,

    #[arg(long)]
    pub status: Option<String>,

    /// Order every station by distance from "lat,lng"
    #[arg(long, value_name = "LAT,LNG")]
    pub near: Option<Coordinates>,
}

#[derive(Args, Debug)]
pub struct CabinetArgs {
    pub station_id: i64,

    #[arg(long)]
    pub battery_type: i64,
}

/// Where the user is: typed address or raw coordinates.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct LocationArgs {
    #[arg(long)]
    pub address: Option<String>,

    #[arg(long, value_name = "LAT,LNG")]
    pub at: Option<Coordinates>,
}

#[derive(Args, Debug)]
pub struct BookArgs {
    #[arg(long)]
    pub vehicle: i64,

    #[arg(long)]
    pub station: i64,

    #[command(flatten)]
    pub location: LocationArgs,

    /// Cabinet to pick from; the first one otherwise
    #[arg(long)]
    pub cabinet: Option<i64>,

    /// Slot to take, at most two
    #[arg(long = "slot")]
    pub slots: Vec<i64>,
}

#[derive(Args, Debug)]
pub struct DirectionsArgs {
    pub station_id: i64,

    #[command(flatten)]
    pub location: LocationArgs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_with_slots() {
        let cli = Cli::try_parse_from([
            "swap", "book", "--vehicle", "7", "--station", "5", "--at", "10.77,106.70", "--slot", "1", "--slot", "2",
        ])
        .unwrap();

        let Command::Book(args) = cli.command else {
            panic!("expected book");
        };
        assert_eq!(args.vehicle, 7);
        assert_eq!(args.slots, vec![1, 2]);
        assert_eq!(args.location.at, Some(Coordinates::new(10.77, 106.70)));
        assert_eq!(args.location.address, None);
        assert_eq!(args.cabinet, None);
    }

    #[test]
    fn test_book_needs_exactly_one_location() {
        assert!(Cli::try_parse_from(["swap", "book", "--vehicle", "7", "--station", "5"]).is_err());
        assert!(Cli::try_parse_from([
            "swap", "book", "--vehicle", "7", "--station", "5", "--at", "10.77,106.70", "--address", "12 Nguyễn Huệ",
        ])
        .is_err());
    }

    #[test]
    fn test_bad_coordinates_rejected() {
        assert!(Cli::try_parse_from(["swap", "stations", "--near", "95,106"]).is_err());
        assert!(Cli::try_parse_from(["swap", "stations", "--near", "north"]).is_err());
    }

    #[test]
    fn test_stations_defaults() {
        let cli = Cli::try_parse_from(["swap", "--log-level", "debug", "stations", "--search", "quận 1"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Command::Stations(args) = cli.command else {
            panic!("expected stations");
        };
        assert_eq!(args.paging.page, 1);
        assert_eq!(args.paging.limit, 10);
        assert_eq!(args.search.as_deref(), Some("quận 1"));
        assert!(args.near.is_none());
    }

    #[test]
    fn test_cabinet_requires_battery_type() {
        assert!(Cli::try_parse_from(["swap", "cabinet", "5"]).is_err());
        let cli = Cli::try_parse_from(["swap", "cabinet", "5", "--battery-type", "3"]).unwrap();
        assert!(matches!(cli.command, Command::Cabinet(CabinetArgs { station_id: 5, battery_type: 3 })));
    }
}
