#[macro_use]
extern crate rocket;

mod entrypoints;

use rocket::http::Method;
use rocket_cors::{AllowedHeaders, AllowedOrigins, CorsOptions};
use rocket_db_pools::Database;
use rocket_prometheus::PrometheusMetrics;
use shared::AwardPolicy;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use green_league_server::{
    auth::IdentityConfig,
    db::{self, DB},
    metrics::TrackerMetrics,
    tracker,
};

use entrypoints::types::*;

#[derive(Debug, serde::Deserialize)]
pub struct Env {
    #[serde(default)]
    award_policy: AwardPolicy,
    identity_header: Option<String>,
    #[serde(default)]
    allowed_origins: Vec<String>,
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Green League API"),
    paths(
        entrypoints::profile::create_profile,
        entrypoints::profile::get_profile,
        entrypoints::profile::update_profile,
        entrypoints::profile::complete_tutorial,
        entrypoints::actions::get_catalog,
        entrypoints::actions::get_actions,
        entrypoints::actions::record_action,
        entrypoints::achievements::get_achievements,
        entrypoints::achievements::check_achievements,
        entrypoints::leaderboards::get_leaderboard,
        entrypoints::leaderboards::get_league_populations,
        entrypoints::leaderboards::get_place,
        entrypoints::leaderboards::get_leagues,
        entrypoints::vouchers::get_vouchers,
        entrypoints::vouchers::redeem_voucher,
        entrypoints::vouchers::get_redemptions,
        entrypoints::analytics::get_analytics,
        entrypoints::statistics::get_statistics,
    ),
    components(schemas(
        PaginatedLeaderboardResponse,
        PaginatedActionResponse,
        CreateProfileRequest,
        UpdateProfileRequest,
        ProfileResponse,
        LeagueProgress,
        ActionCatalogEntry,
        RecordActionRequest,
        RecordActionResponse,
        ActionResponse,
        EarnedAchievement,
        AchievementResponse,
        AchievementCheckResponse,
        LeaderboardResponse,
        LeaguePopulation,
        PlaceResponse,
        LeagueResponse,
        VoucherResponse,
        RedemptionResponse,
        Statistics,
        shared::League,
        shared::Promotion,
        shared::GreenAction,
        shared::Voucher,
        shared::VoucherCategory,
        shared::Analytics,
        shared::DailyProgress,
        shared::ActionBreakdown,
        shared::MonthlyProgress,
        shared::Impact,
        shared::DailyStreak,
    ))
)]
struct ApiDoc;

#[launch]
async fn rocket() -> _ {
    dotenv::dotenv().ok();

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().pretty());
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    let env = envy::from_env::<Env>().expect("Failed to load environment variables");
    let identity = env
        .identity_header
        .map(|header| IdentityConfig { header })
        .unwrap_or_default();

    let prometheus = PrometheusMetrics::new();
    let metrics = TrackerMetrics::new().expect("Failed to create tracker metrics");
    metrics
        .register(prometheus.registry())
        .expect("Failed to register tracker metrics");

    let allowed_origins = if env.allowed_origins.is_empty() {
        AllowedOrigins::all()
    } else {
        AllowedOrigins::some_exact(&env.allowed_origins)
    };
    let cors = CorsOptions {
        allowed_origins,
        allowed_methods: [Method::Get, Method::Post, Method::Patch, Method::Options]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::all(),
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()
    .expect("Failed to create CORS fairing");

    tracing::info!("Reading family identity from {}", identity.header);

    rocket::build()
        .attach(tracker::stage(
            db::attach,
            |rocket| DB::fetch(rocket).cloned(),
            env.award_policy,
            metrics,
        ))
        .manage(identity)
        .attach(prometheus.clone())
        .attach(cors)
        .attach(entrypoints::stage())
        .mount("/metrics", prometheus)
        .mount(
            "/",
            SwaggerUi::new("/swagger-ui/<_..>").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
}
