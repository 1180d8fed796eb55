use green_league_server::{db::DB, tracker::Tracker};
use rocket::fairing::AdHoc;

pub mod achievements;
pub mod actions;
pub mod analytics;
pub mod leaderboards;
pub mod profile;
pub mod statistics;
pub mod types;
pub mod vouchers;

pub type AppTracker = Tracker<DB>;

pub fn stage() -> AdHoc {
    AdHoc::on_ignite("Installing entrypoints", |rocket| async {
        rocket
            .attach(profile::stage())
            .attach(actions::stage())
            .attach(achievements::stage())
            .attach(leaderboards::stage())
            .attach(vouchers::stage())
            .attach(analytics::stage())
            .attach(statistics::stage())
    })
}
