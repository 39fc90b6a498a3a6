use crate::app::App;
use crate::state::codec::ScalarAnswer;
use crate::state::messages::NetworkRequest;
use crate::state::pairing::SelectOutcome;
use crate::state::phase_gate::Phase;
use crate::state::session::{FinalVotePick, PairingContext};
use crate::view;
use lovecast_api::{CommittedPair, Side};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Pick { context: PairingContext, side: Side, contestant_id: u32 },
    Unpair { context: PairingContext, pair: CommittedPair },
    Reset { context: PairingContext },
    Answer { item_id: u32, answer: ScalarAnswer },
    Clear { item_id: u32 },
    FinalPick { pick: FinalVotePick, contestant_id: u32 },
    Submit(Phase),
    Confirm,
    Refresh,
    History,
    Profile,
    Rankings,
    Status,
    Help,
    Quit,
}

/// What the event loop should do after a command.
#[derive(Debug, Default)]
pub struct CommandEffect {
    pub request: Option<NetworkRequest>,
    pub output: Option<String>,
    pub quit: bool,
}

impl CommandEffect {
    fn say(output: impl Into<String>) -> Self {
        Self { output: Some(output.into()), ..Self::default() }
    }

    pub(crate) fn send(request: NetworkRequest) -> Self {
        Self { request: Some(request), ..Self::default() }
    }
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["pick", ctx, side, id] => Ok(Command::Pick {
            context: parse_context(ctx)?,
            side: parse_side(side)?,
            contestant_id: parse_id(id)?,
        }),
        ["unpair", ctx, a, b] => Ok(Command::Unpair {
            context: parse_context(ctx)?,
            pair: CommittedPair::new(parse_id(a)?, parse_id(b)?),
        }),
        ["reset", ctx] => Ok(Command::Reset { context: parse_context(ctx)? }),
        ["answer", item, value] => {
            let answer = match *value {
                "yes" | "y" | "o" => ScalarAnswer::Binary(true),
                "no" | "n" | "x" => ScalarAnswer::Binary(false),
                id => ScalarAnswer::Target(parse_id(id)?),
            };
            Ok(Command::Answer { item_id: parse_id(item)?, answer })
        }
        ["clear", item] => Ok(Command::Clear { item_id: parse_id(item)? }),
        ["final", which, id] => {
            let pick = match *which {
                "zero" => FinalVotePick::ZeroVote,
                "popular" => FinalVotePick::Popular,
                other => return Err(format!("unknown final vote pick '{other}' (zero|popular)")),
            };
            Ok(Command::FinalPick { pick, contestant_id: parse_id(id)? })
        }
        ["submit", phase] => match *phase {
            "season" => Ok(Command::Submit(Phase::SeasonPairing)),
            "final" => Ok(Command::Submit(Phase::FinalVote)),
            "episode" => Ok(Command::Submit(Phase::Episode)),
            other => Err(format!("unknown phase '{other}' (season|final|episode)")),
        },
        ["confirm"] => Ok(Command::Confirm),
        ["refresh"] => Ok(Command::Refresh),
        ["history"] => Ok(Command::History),
        ["profile"] => Ok(Command::Profile),
        ["rankings"] | ["ranking"] => Ok(Command::Rankings),
        ["status"] | [] => Ok(Command::Status),
        ["help"] | ["?"] => Ok(Command::Help),
        ["quit"] | ["q"] | ["exit"] => Ok(Command::Quit),
        _ => Err(format!("unrecognised command '{}', type help", line.trim())),
    }
}

fn parse_context(raw: &str) -> Result<PairingContext, String> {
    match raw {
        "season" => Ok(PairingContext::Season),
        "msg" | "message" => Ok(PairingContext::MessageTarget),
        other => Err(format!("unknown pairing board '{other}' (season|msg)")),
    }
}

fn parse_side(raw: &str) -> Result<Side, String> {
    match raw {
        "f" | "female" | "a" => Ok(Side::A),
        "m" | "male" | "b" => Ok(Side::B),
        other => Err(format!("unknown side '{other}' (f|m)")),
    }
}

fn parse_id(raw: &str) -> Result<u32, String> {
    raw.parse().map_err(|_| format!("'{raw}' is not an id"))
}

pub fn handle_command(command: Command, app: &mut App) -> CommandEffect {
    let result = match command {
        Command::Pick { context, side, contestant_id } => app
            .session
            .select_side(context, side, contestant_id)
            .map(|outcome| match outcome {
                SelectOutcome::Pending => {
                    format!("{} picked, choose the other side", name(app, contestant_id))
                }
                SelectOutcome::Committed(pair) => view::pair_label(pair, app.session.roster()),
                SelectOutcome::Rejected => "Already paired, selection cleared".to_owned(),
            }),
        Command::Unpair { context, pair } => {
            app.session.remove_pair(context, pair).map(|removed| {
                if removed { "Pair removed" } else { "No such pair" }.to_owned()
            })
        }
        Command::Reset { context } => {
            app.session.reset_pairs(context).map(|()| "Pairs cleared".to_owned())
        }
        Command::Answer { item_id, answer } => {
            app.session.set_scalar_answer(item_id, answer).map(|()| "Answer saved".to_owned())
        }
        Command::Clear { item_id } => {
            app.session.clear_scalar_answer(item_id).map(|_| "Answer cleared".to_owned())
        }
        Command::FinalPick { pick, contestant_id } => app
            .session
            .set_final_vote_pick(pick, contestant_id)
            .map(|()| {
                let which = match pick {
                    FinalVotePick::ZeroVote => "Final zero-vote",
                    FinalVotePick::Popular => "Most popular",
                };
                format!("{which}: {}", name(app, contestant_id))
            }),
        Command::Submit(phase) => return submit(phase, app),
        Command::Confirm => {
            return match app.take_pending_confirmation() {
                Some(submission) => CommandEffect::send(NetworkRequest::Submit { submission }),
                None => CommandEffect::say("Nothing waiting for confirmation"),
            };
        }
        Command::Refresh => return CommandEffect::send(app.request_overview()),
        Command::History => return CommandEffect::send(NetworkRequest::LoadHistory),
        Command::Profile => return CommandEffect::send(NetworkRequest::LoadProfile),
        Command::Rankings => return CommandEffect::send(NetworkRequest::LoadRankings),
        Command::Status => return CommandEffect::say(view::render_status(&app.session)),
        Command::Help => return CommandEffect::say(view::help_text()),
        Command::Quit => return CommandEffect { quit: true, ..CommandEffect::default() },
    };

    match result {
        Ok(message) => CommandEffect::say(message),
        Err(e) => CommandEffect::say(e.to_string()),
    }
}

fn submit(phase: Phase, app: &mut App) -> CommandEffect {
    let prepared = match phase {
        Phase::SeasonPairing => app.session.prepare_season_pairs().map(Some),
        Phase::FinalVote => app.session.prepare_final_vote().map(Some),
        Phase::Episode => app.session.prepare_episode_answers(),
    };
    match prepared {
        Ok(Some(submission)) if phase == Phase::Episode => {
            app.await_confirmation(submission);
            CommandEffect::say(
                "Episode predictions can't be changed once submitted. Type `confirm` to send them.",
            )
        }
        Ok(Some(submission)) => CommandEffect::send(NetworkRequest::Submit { submission }),
        Ok(None) => CommandEffect::say("Nothing to submit yet"),
        Err(e) => CommandEffect::say(e.to_string()),
    }
}

fn name(app: &App, contestant_id: u32) -> String {
    app.session
        .roster()
        .name_of(contestant_id)
        .map(str::to_owned)
        .unwrap_or_else(|| contestant_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::app_settings::AppSettings;
    use crate::state::session::tests::overview;

    fn app() -> App {
        let mut app = App::new(AppSettings::default());
        let NetworkRequest::LoadOverview { ticket } = app.request_overview() else {
            panic!("expected overview request");
        };
        assert!(app.on_overview_loaded(ticket, overview()));
        app
    }

    fn run(app: &mut App, line: &str) -> CommandEffect {
        handle_command(parse_command(line).unwrap(), app)
    }

    #[test]
    fn parses_pairing_and_answer_commands() {
        assert_eq!(
            parse_command("pick season f 3"),
            Ok(Command::Pick { context: PairingContext::Season, side: Side::A, contestant_id: 3 })
        );
        assert_eq!(
            parse_command("answer 12 no"),
            Ok(Command::Answer { item_id: 12, answer: ScalarAnswer::Binary(false) })
        );
        assert_eq!(parse_command("  "), Ok(Command::Status));
        assert!(parse_command("pick season x 3").is_err());
        assert!(parse_command("answer twelve 3").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn committing_a_pair_prints_names() {
        let mut app = app();
        let effect = run(&mut app, "pick season f 1");
        assert!(effect.output.unwrap().contains("Jiwoo picked"));
        let effect = run(&mut app, "pick season m 2");
        assert_eq!(effect.output.as_deref(), Some("Jiwoo ♥ Minsu"));
    }

    #[test]
    fn rejected_pick_clears_selection() {
        let mut app = app();
        run(&mut app, "pick season f 1");
        run(&mut app, "pick season m 2");
        run(&mut app, "pick season f 1");
        let effect = run(&mut app, "pick season m 2");
        assert_eq!(effect.output.as_deref(), Some("Already paired, selection cleared"));
        assert!(effect.request.is_none());
        assert!(app.session.pending(PairingContext::Season).is_empty());
    }

    #[test]
    fn season_submit_goes_straight_to_network() {
        let mut app = app();
        run(&mut app, "pick season f 1");
        run(&mut app, "pick season m 2");
        let effect = run(&mut app, "submit season");
        assert!(matches!(effect.request, Some(NetworkRequest::Submit { .. })));
    }

    #[test]
    fn episode_submit_requires_confirmation() {
        let mut app = app();
        run(&mut app, "answer 12 yes");
        let effect = run(&mut app, "submit episode");
        assert!(effect.request.is_none());
        assert!(effect.output.unwrap().contains("confirm"));

        let effect = run(&mut app, "confirm");
        assert!(matches!(effect.request, Some(NetworkRequest::Submit { .. })));
        let effect = run(&mut app, "confirm");
        assert!(effect.request.is_none());
    }

    #[test]
    fn empty_episode_submit_sends_nothing() {
        let mut app = app();
        let effect = run(&mut app, "submit episode");
        assert!(effect.request.is_none());
        assert_eq!(effect.output.as_deref(), Some("Nothing to submit yet"));
    }

    #[test]
    fn precondition_errors_are_reported_locally() {
        let mut app = app();
        let effect = run(&mut app, "submit final");
        assert!(effect.request.is_none());
        assert!(effect.output.unwrap().contains("final zero-vote"));
    }

    #[test]
    fn locked_season_submit_stays_local() {
        let mut app = app();
        run(&mut app, "pick season f 1");
        run(&mut app, "pick season m 2");
        app.session.gate.lock(Phase::SeasonPairing);
        assert!(!app.session.can_submit(Phase::SeasonPairing));
        let effect = run(&mut app, "submit season");
        assert!(effect.request.is_none());
        assert!(effect.output.unwrap().contains("locked"));
    }

    #[test]
    fn rankings_command_requests_the_leaderboard() {
        let mut app = app();
        assert_eq!(parse_command("rankings"), Ok(Command::Rankings));
        let effect = run(&mut app, "rankings");
        assert!(matches!(effect.request, Some(NetworkRequest::LoadRankings)));
    }

    #[test]
    fn quit_stops_the_loop() {
        let mut app = app();
        assert!(run(&mut app, "quit").quit);
    }
}
