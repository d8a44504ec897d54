use crate::infra::{
    CampaignFixture, InMemoryCampaignStore, OfflineTextGenerator, TracingAnalyticsSink,
};
use chrono::{DateTime, Utc};
use clap::Args;
use outreach_ai::error::AppError;
use outreach_ai::workflows::outreach::{
    default_rules, CampaignGoals, Candidate, CommunicationPlanView, ConversionForecast,
    DecisionService, ProspectProfile, Strategy,
};
use std::path::PathBuf;
use std::sync::Arc;

type FixtureService =
    DecisionService<InMemoryCampaignStore, TracingAnalyticsSink, OfflineTextGenerator>;

#[derive(Args, Debug)]
pub(crate) struct StrategyArgs {
    /// Campaign fixture with `campaign`, `candidates`, and optional `analytics`
    #[arg(long)]
    pub(crate) fixture: PathBuf,
    /// Evaluation instant (RFC 3339). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_instant)]
    pub(crate) as_of: Option<DateTime<Utc>>,
    /// Print the strategy as JSON instead of a summary
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct PredictArgs {
    /// JSON array of prospect profiles
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Campaign type used as the rate multiplier key
    #[arg(long, default_value = "enrollment")]
    pub(crate) campaign_type: String,
}

#[derive(Args, Debug)]
pub(crate) struct PlanArgs {
    /// JSON file holding one candidate record
    #[arg(long)]
    pub(crate) candidate: PathBuf,
    /// Objective the outreach is working towards
    #[arg(long, default_value = "Confirm enrollment interest")]
    pub(crate) objective: String,
    /// Optional call to action passed to message drafting
    #[arg(long)]
    pub(crate) call_to_action: Option<String>,
}

fn fixture_service(store: InMemoryCampaignStore) -> FixtureService {
    DecisionService::new(
        Arc::new(store),
        Arc::new(TracingAnalyticsSink::default()),
        Arc::new(OfflineTextGenerator),
        default_rules(),
    )
}

pub(crate) fn run_strategy(args: StrategyArgs) -> Result<(), AppError> {
    let StrategyArgs {
        fixture,
        as_of,
        json,
    } = args;

    let fixture = CampaignFixture::load(&fixture)?;
    let campaign_id = fixture.campaign.id.clone();
    let campaign_name = fixture.campaign.name.clone();
    let service = fixture_service(InMemoryCampaignStore::from_fixture(fixture));

    let now = as_of.unwrap_or_else(Utc::now);
    let strategy = service.generate_strategy_at(&campaign_id, now)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&strategy)?);
    } else {
        render_strategy(&campaign_name, &strategy, now);
    }
    Ok(())
}

pub(crate) fn run_predict(args: PredictArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.input)?;
    let prospects: Vec<ProspectProfile> = serde_json::from_str(&raw)?;

    let service = fixture_service(InMemoryCampaignStore::default());
    let forecast = service.predict_conversion(&prospects, &args.campaign_type)?;
    render_forecast(&forecast);
    Ok(())
}

pub(crate) fn run_plan(args: PlanArgs) -> Result<(), AppError> {
    let raw = std::fs::read_to_string(&args.candidate)?;
    let candidate: Candidate = serde_json::from_str(&raw)?;
    let goals = CampaignGoals {
        objective: args.objective,
        call_to_action: args.call_to_action,
    };

    let service = fixture_service(InMemoryCampaignStore::default());
    let view = service.plan_communication(&candidate, &goals);
    render_plan(&candidate, &view);
    Ok(())
}

pub(crate) fn render_strategy(campaign_name: &str, strategy: &Strategy, now: DateTime<Utc>) {
    println!(
        "Campaign strategy: {} ({}) as of {}",
        campaign_name,
        strategy.campaign_id,
        now.format("%Y-%m-%d %H:%M UTC")
    );
    println!("- {} candidates evaluated", strategy.total_candidates);

    let effectiveness = &strategy.effectiveness;
    println!(
        "- {:.1}% average conversion | {} expected conversions | {:?} efficiency",
        effectiveness.average_conversion_rate * 100.0,
        effectiveness.expected_conversions,
        effectiveness.efficiency
    );

    let channels: Vec<&str> = strategy
        .channel_priority
        .iter()
        .map(|channel| channel.label())
        .collect();
    println!("- Channel priority: {}", channels.join(" > "));

    let timeline = &strategy.estimated_timeline;
    println!(
        "- Timeline: {} immediate ({}) | {} short term ({}) | {} long term ({})",
        timeline.phases.immediate,
        timeline.estimated_duration.immediate,
        timeline.phases.short_term,
        timeline.estimated_duration.short_term,
        timeline.phases.long_term,
        timeline.estimated_duration.long_term
    );

    if strategy.recommendations.is_empty() {
        println!("No candidates to contact.");
        return;
    }

    println!("Recommendations:");
    for rec in &strategy.recommendations {
        let actions = if rec.recommended_actions.is_empty() {
            "no action".to_string()
        } else {
            rec.recommended_actions
                .iter()
                .map(|action| action.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        };
        println!(
            "  - {} [{}]: priority {} | {:.1}% | {}",
            rec.name,
            rec.candidate_id,
            rec.priority,
            rec.estimated_conversion_rate * 100.0,
            actions
        );
    }
}

pub(crate) fn render_forecast(forecast: &ConversionForecast) {
    println!(
        "Conversion forecast for a {} campaign",
        forecast.campaign_type.label()
    );
    println!(
        "- {} prospects | {:.1}% average | {} expected conversions",
        forecast.candidate_count,
        forecast.average_rate * 100.0,
        forecast.expected_conversions
    );
    for prediction in &forecast.predictions {
        println!(
            "  - {}: {:.1}% (confidence {:.0}%)",
            prediction.candidate,
            prediction.predicted_rate * 100.0,
            prediction.confidence * 100.0
        );
        for factor in &prediction.factors {
            println!("      * {}", factor);
        }
    }
    for insight in &forecast.narrative.insights {
        println!("Note: {}", insight);
    }
}

pub(crate) fn render_plan(candidate: &Candidate, view: &CommunicationPlanView) {
    let plan = &view.plan;
    println!("Communication plan for {} [{}]", candidate.name, plan.candidate_id);
    if plan.channel_strategy.is_empty() {
        println!("- No reachable channel on file");
    } else {
        let channels: Vec<&str> = plan
            .channel_strategy
            .iter()
            .map(|channel| channel.label())
            .collect();
        println!("- Channels: {}", channels.join(", "));
    }
    println!(
        "- Contact window: {} at {}",
        plan.contact_window.preferred_days.join("/"),
        plan.contact_window.preferred_hours
    );
    println!("Follow-up cadence:");
    for draft in &view.drafts {
        println!(
            "  - day {:>2} via {} ({:?}): {}",
            draft.day,
            draft.channel.label(),
            draft.source,
            draft.body
        );
    }
}
