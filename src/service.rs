//! Store, permission, and version plumbing around the pure engine logic.
//!
//! Every mutating call follows the same shape: read the aggregate, check the
//! caller owns it, run the pure logic on the in-memory copy, commit with the
//! version the caller read, then emit the collected events. A stale version
//! surfaces as [`EngineError::Conflict`] and the caller re-reads and retries.

use crate::bracket::instantiate_skeleton;
use crate::events::{Event, EventEmitter, EventKind};
use crate::logic::{
    amend_result, record_interim_score, submit_result, validate_mutation,
    validate_tournament_graph, AdvancementOutcome, EngineError, ProposedChange,
};
use crate::models::{
    Competitor, CompetitorId, Label, MatchId, RuleSet, RuleSetId, Rules, Side, Sport, SportId,
    Status, Tournament, TournamentId,
};
use crate::ruleset::{RuleSetCapability, RuleSetRegistry};
use crate::store::{CascadePolicy, Entity, EntityKind, EntityStore, Filter};

pub struct TournamentService<S: EntityStore, E: EventEmitter> {
    store: S,
    emitter: E,
    rulesets: RuleSetRegistry,
}

impl<S: EntityStore, E: EventEmitter> TournamentService<S, E> {
    pub fn new(store: S, emitter: E, rulesets: RuleSetRegistry) -> Self {
        Self {
            store,
            emitter,
            rulesets,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn emitter(&self) -> &E {
        &self.emitter
    }

    pub fn register_ruleset_capability(
        &mut self,
        id: RuleSetId,
        capability: Box<dyn RuleSetCapability>,
    ) {
        self.rulesets.register(id, capability);
    }

    pub fn create_sport(
        &self,
        label: Label,
        ruleset_ids: Vec<RuleSetId>,
    ) -> Result<Sport, EngineError> {
        let sport = Sport::new(label, ruleset_ids);
        self.store.put(Entity::Sport(sport.clone()), None)?;
        Ok(sport)
    }

    pub fn create_ruleset(
        &self,
        label: Label,
        sport_ids: Vec<SportId>,
    ) -> Result<RuleSet, EngineError> {
        let ruleset = RuleSet::new(label, sport_ids);
        self.store.put(Entity::RuleSet(ruleset.clone()), None)?;
        Ok(ruleset)
    }

    /// Register a competitor. Emails are unique system-wide.
    pub fn register_competitor(
        &self,
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        affiliation: Option<String>,
    ) -> Result<Competitor, EngineError> {
        let email = email.into();
        let existing = self
            .store
            .query(EntityKind::Competitor, &Filter::CompetitorEmail(email.clone()))?;
        if !existing.is_empty() {
            return Err(EngineError::DuplicateEmail(email));
        }
        let mut competitor = Competitor::new(email, first_name, last_name);
        competitor.affiliation = affiliation;
        self.store.put(Entity::Competitor(competitor.clone()), None)?;
        Ok(competitor)
    }

    /// Create a tournament with its sport, rules, and roster. The rule set
    /// must be applicable to the sport and every competitor must exist.
    ///
    /// Competitor back-references are written after the tournament itself. If
    /// the backend fails partway through that pass, the tournament is fully
    /// persisted but some rosters lack the back-reference; a remote store
    /// should reconcile those from the tournament's competitor list.
    pub fn create_tournament(
        &self,
        owner: impl Into<String>,
        label: Label,
        sport_id: SportId,
        rules: Rules,
        competitor_ids: Vec<CompetitorId>,
    ) -> Result<Tournament, EngineError> {
        let sport = self.store.get_sport(sport_id)?;
        let mut roster = Vec::with_capacity(competitor_ids.len());
        for &competitor_id in &competitor_ids {
            roster.push(self.store.get_competitor(competitor_id)?);
        }
        let mut tournament = Tournament::new(owner, label, sport_id, rules, competitor_ids);
        validate_tournament_graph(&tournament, &sport)?;
        let version = self
            .store
            .put(Entity::Tournament(tournament.clone()), None)?;
        tournament.version = version;
        for mut competitor in roster {
            competitor.tournament_ids.push(tournament.id);
            self.store.put(Entity::Competitor(competitor), None)?;
        }
        log::info!("created tournament {} ({})", tournament.id, tournament.label.name);
        Ok(tournament)
    }

    pub fn get_tournament(&self, id: TournamentId) -> Result<Tournament, EngineError> {
        Ok(self.store.get_tournament(id)?)
    }

    /// All tournaments owned by the given identity.
    pub fn tournaments_by_owner(&self, owner: &str) -> Result<Vec<Tournament>, EngineError> {
        let hits = self.store.query(
            EntityKind::Tournament,
            &Filter::TournamentsByOwner(owner.to_string()),
        )?;
        Ok(hits
            .into_iter()
            .filter_map(|entity| match entity {
                Entity::Tournament(t) => Some(t),
                _ => None,
            })
            .collect())
    }

    /// Build the bracket skeleton via the tournament's rule set capability,
    /// instantiate it, validate the resulting graph, and persist. Emits
    /// MatchReady for every opening match.
    pub fn generate_bracket(
        &self,
        caller: &str,
        tournament_id: TournamentId,
        expected_version: u64,
    ) -> Result<Tournament, EngineError> {
        let (mut tournament, sport) = self.load_owned(caller, tournament_id)?;
        let capability = self.rulesets.get(tournament.rules.ruleset_id)?;
        let skeleton = capability.build_bracket(&tournament.competitor_ids, &tournament.rules.params)?;
        instantiate_skeleton(&mut tournament, &skeleton)?;
        validate_tournament_graph(&tournament, &sport)?;
        let ready: Vec<MatchId> = tournament
            .matches()
            .filter(|m| m.status == Status::Ready)
            .map(|m| m.id)
            .collect();
        let version = self
            .store
            .put(Entity::Tournament(tournament.clone()), Some(expected_version))?;
        tournament.version = version;
        for match_id in ready {
            self.emitter
                .emit(&Event::new(EventKind::MatchReady, tournament.id, match_id));
        }
        Ok(tournament)
    }

    /// Apply a match result and commit the whole propagation cascade
    /// atomically. Returns the outcome and the tournament's new version.
    pub fn submit_result(
        &self,
        caller: &str,
        tournament_id: TournamentId,
        expected_version: u64,
        match_id: MatchId,
        red_score: u32,
        blue_score: u32,
    ) -> Result<(AdvancementOutcome, u64), EngineError> {
        let (mut tournament, _) = self.load_owned(caller, tournament_id)?;
        let capability = self.rulesets.get(tournament.rules.ruleset_id)?;
        let outcome = submit_result(&mut tournament, match_id, red_score, blue_score, capability)?;
        let version = self
            .store
            .put(Entity::Tournament(tournament), Some(expected_version))?;
        self.emit_all(&outcome.events);
        log::info!("result recorded for match {match_id} in tournament {tournament_id}");
        Ok((outcome, version))
    }

    /// Amend an already-completed result; see [`amend_result`] for force
    /// semantics.
    pub fn amend_result(
        &self,
        caller: &str,
        tournament_id: TournamentId,
        expected_version: u64,
        match_id: MatchId,
        red_score: u32,
        blue_score: u32,
        force: bool,
    ) -> Result<(AdvancementOutcome, u64), EngineError> {
        let (mut tournament, _) = self.load_owned(caller, tournament_id)?;
        let capability = self.rulesets.get(tournament.rules.ruleset_id)?;
        let outcome = amend_result(
            &mut tournament,
            match_id,
            red_score,
            blue_score,
            force,
            capability,
        )?;
        let version = self
            .store
            .put(Entity::Tournament(tournament), Some(expected_version))?;
        self.emit_all(&outcome.events);
        if !outcome.reverted.is_empty() {
            log::warn!(
                "amendment of match {match_id} reverted {} downstream match(es)",
                outcome.reverted.len()
            );
        }
        Ok((outcome, version))
    }

    /// Record a partial score (marks the match InProgress).
    pub fn record_interim_score(
        &self,
        caller: &str,
        tournament_id: TournamentId,
        expected_version: u64,
        match_id: MatchId,
        side: Side,
        score: u32,
    ) -> Result<u64, EngineError> {
        let (mut tournament, _) = self.load_owned(caller, tournament_id)?;
        record_interim_score(&mut tournament, match_id, side, score)?;
        let version = self
            .store
            .put(Entity::Tournament(tournament), Some(expected_version))?;
        Ok(version)
    }

    /// Structural edit: move a match within its group. Locked once the
    /// tournament has started.
    pub fn set_match_ordinality(
        &self,
        caller: &str,
        tournament_id: TournamentId,
        expected_version: u64,
        match_id: MatchId,
        ordinality: u32,
    ) -> Result<u64, EngineError> {
        let (mut tournament, sport) = self.load_owned(caller, tournament_id)?;
        validate_mutation(&tournament, match_id, &ProposedChange::Ordinality(ordinality))?;
        if let Some(m) = tournament.match_mut(match_id) {
            m.ordinality = ordinality;
        }
        validate_tournament_graph(&tournament, &sport)?;
        let version = self
            .store
            .put(Entity::Tournament(tournament), Some(expected_version))?;
        Ok(version)
    }

    /// Delete a tournament; stages, groups, matches, and Rules go with the
    /// aggregate, and competitor rosters are detached.
    pub fn delete_tournament(
        &self,
        caller: &str,
        tournament_id: TournamentId,
    ) -> Result<(), EngineError> {
        let tournament = self.store.get_tournament(tournament_id)?;
        if tournament.owner != caller {
            return Err(EngineError::PermissionDenied);
        }
        self.store.delete(tournament_id, CascadePolicy::Cascade)?;
        log::info!("deleted tournament {tournament_id}");
        Ok(())
    }

    fn load_owned(
        &self,
        caller: &str,
        tournament_id: TournamentId,
    ) -> Result<(Tournament, Sport), EngineError> {
        let tournament = self.store.get_tournament(tournament_id)?;
        if tournament.owner != caller {
            return Err(EngineError::PermissionDenied);
        }
        let sport = self.store.get_sport(tournament.sport_id)?;
        Ok((tournament, sport))
    }

    fn emit_all(&self, events: &[Event]) {
        for event in events {
            self.emitter.emit(event);
        }
    }
}
