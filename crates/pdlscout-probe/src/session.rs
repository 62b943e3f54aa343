// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Capability session: fingerprint one target over IPP, HTTP and SNMP and
// decide whether it supports the requested page-description language.
//
// Lifecycle: Initialized → ProbingIpp → ProbingHttp → ProbingSnmp →
// Reporting → Continuing | Terminated. Every probe runs regardless of how
// the previous one went; a failure only shows up in that probe's report.

use chrono::Utc;
use tracing::{debug, info, warn};

use pdlscout_core::config::SessionConfig;
use pdlscout_core::types::{
    LanguageAliasSet, ModelEntry, ProbeOutcome, ProbeReport, ProbeResult, Protocol,
    SessionReport, SessionState, SupportSignal, Verdict,
};

use crate::database::{ModelDatabase, matching_entries};
use crate::http::HttpProbe;
use crate::ipp::IppProbe;
use crate::probe::Probe;
use crate::snmp::{SnmpProbe, snmp_available};

/// One verification run against one printer.
///
/// The accumulated support list belongs to this session alone; a new target
/// needs a new session.
pub struct CapabilitySession {
    config: SessionConfig,
    aliases: LanguageAliasSet,
    entries: Vec<ModelEntry>,
    probes: Vec<Box<dyn Probe>>,
    support: Vec<SupportSignal>,
    state: SessionState,
}

impl CapabilitySession {
    /// Session using the network probes and the database in `config.db_dir`.
    pub fn new(config: SessionConfig) -> Self {
        if !snmp_available() {
            warn!("SNMP support not installed, the SNMP probe will report it as missing");
        }
        let database = ModelDatabase::open(&config.db_dir);
        let probes: Vec<Box<dyn Probe>> = vec![
            Box::new(IppProbe::new(config.ports.ipp, config.ipp_timeout())),
            Box::new(HttpProbe::new(config.ports.http, config.timeout)),
            Box::new(SnmpProbe::new(config.ports.snmp, config.timeout)),
        ];
        Self::with_probes(config, &database, probes)
    }

    /// Session with explicit probes, run in the order given.
    ///
    /// The database is only read when the configuration asks for
    /// verification (`safe`).
    pub fn with_probes(
        config: SessionConfig,
        database: &ModelDatabase,
        probes: Vec<Box<dyn Probe>>,
    ) -> Self {
        let aliases = config.mode.aliases();
        let entries = if config.safe {
            database.load(config.mode)
        } else {
            Vec::new()
        };
        Self {
            config,
            aliases,
            entries,
            probes,
            support: Vec::new(),
            state: SessionState::Initialized,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Everything matched so far.
    pub fn support(&self) -> &[SupportSignal] {
        &self.support
    }

    /// Run every probe and decide. `on_probe` sees each probe's report as
    /// soon as that probe finishes, in probing order.
    pub async fn run<F>(&mut self, mut on_probe: F) -> SessionReport
    where
        F: FnMut(&ProbeReport),
    {
        let started_at = Utc::now();
        let mut reports = Vec::with_capacity(self.probes.len());

        if !self.config.safe {
            debug!(host = %self.config.target, "verification not requested, skipping probes");
            return self.report(reports, Verdict::Skipped, started_at);
        }

        info!(
            host = %self.config.target,
            mode = %self.config.mode,
            entries = self.entries.len(),
            "starting capability session"
        );

        let probes = std::mem::take(&mut self.probes);
        for probe in &probes {
            self.state = probing_state(probe.protocol());
            let result = probe.probe(&self.config.target).await;
            let report = ProbeReport {
                protocol: probe.protocol(),
                outcome: self.fold(probe.protocol(), result),
            };
            on_probe(&report);
            reports.push(report);
        }
        self.probes = probes;

        self.state = SessionState::Reporting;
        let verdict = if self.support.is_empty() {
            self.state = SessionState::Terminated;
            Verdict::Abort
        } else {
            self.state = SessionState::Continuing;
            Verdict::Continue
        };

        info!(
            host = %self.config.target,
            signals = self.support.len(),
            ?verdict,
            "capability session finished"
        );
        self.report(reports, verdict, started_at)
    }

    /// Fold one probe result into the support list and classify it.
    fn fold(&mut self, protocol: Protocol, result: ProbeResult) -> ProbeOutcome {
        let fingerprint = match result {
            Ok(fp) => fp,
            Err(e) => {
                debug!(%protocol, error = %e, "probe failed");
                return ProbeOutcome::Failed(e.to_string());
            }
        };

        for alias in self.aliases.matching(&fingerprint.languages) {
            debug!(%protocol, alias, "language alias advertised");
            self.support.push(SupportSignal::LanguageAlias(alias.to_string()));
        }

        let matched = matching_entries(&self.entries, &fingerprint.model);
        if matched.is_empty() {
            debug!(%protocol, model = %fingerprint.model, "no database entry identifies model");
            return ProbeOutcome::NoData;
        }

        debug!(%protocol, model = %fingerprint.model, matches = matched.len(), "model identified");
        self.support
            .extend(matched.into_iter().map(SupportSignal::Database));
        ProbeOutcome::Found(fingerprint.model)
    }

    fn report(
        &self,
        probes: Vec<ProbeReport>,
        verdict: Verdict,
        started_at: chrono::DateTime<Utc>,
    ) -> SessionReport {
        SessionReport {
            target: self.config.target.clone(),
            mode: self.config.mode,
            language: self.aliases.display_name().to_string(),
            probes,
            support: self.support.clone(),
            language_supported: !self.support.is_empty(),
            verdict,
            started_at,
            finished_at: Utc::now(),
        }
    }
}

fn probing_state(protocol: Protocol) -> SessionState {
    match protocol {
        Protocol::Ipp => SessionState::ProbingIpp,
        Protocol::Http => SessionState::ProbingHttp,
        Protocol::Snmp => SessionState::ProbingSnmp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use pdlscout_core::error::ProbeError;
    use pdlscout_core::types::{Fingerprint, Mode};

    use crate::test_support::{http_ok, serve_once};

    struct StubProbe {
        protocol: Protocol,
        result: ProbeResult,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Probe for StubProbe {
        fn protocol(&self) -> Protocol {
            self.protocol
        }

        async fn probe(&self, _host: &str) -> ProbeResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn stubs(
        ipp: ProbeResult,
        http: ProbeResult,
        snmp: ProbeResult,
    ) -> (Vec<Box<dyn Probe>>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let probes: Vec<Box<dyn Probe>> = [(Protocol::Ipp, ipp), (Protocol::Http, http), (Protocol::Snmp, snmp)]
            .into_iter()
            .map(|(protocol, result)| {
                Box::new(StubProbe {
                    protocol,
                    result,
                    calls: calls.clone(),
                }) as Box<dyn Probe>
            })
            .collect();
        (probes, calls)
    }

    fn database(mode: Mode, contents: &str) -> (tempfile::TempDir, ModelDatabase) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db = ModelDatabase::open(dir.path());
        std::fs::write(db.path(mode), contents).expect("write db");
        (dir, db)
    }

    fn safe_config(mode: Mode) -> SessionConfig {
        let mut config = SessionConfig::new("printer.test", mode);
        config.safe = true;
        config
    }

    fn timeout() -> ProbeResult {
        Err(ProbeError::Transport("timed out".into()))
    }

    #[tokio::test]
    async fn ipp_match_adds_entry_and_alias() {
        let (_dir, db) = database(Mode::Pcl, "LaserJet 4250\n");
        let (probes, _) = stubs(
            Ok(Fingerprint::new("hp LaserJet 4250 w", "PCL,PJL")),
            Ok(Fingerprint::default()),
            timeout(),
        );

        let mut session = CapabilitySession::with_probes(safe_config(Mode::Pcl), &db, probes);
        let report = session.run(|_| {}).await;

        assert!(report.support.contains(&SupportSignal::Database(ModelEntry::new("LaserJet 4250"))));
        assert!(report.support.contains(&SupportSignal::LanguageAlias("PCL".into())));
        assert_eq!(report.language, "PCL");
        assert!(report.language_supported);
        assert_eq!(report.verdict, Verdict::Continue);
        assert_eq!(
            report.probes[0].outcome,
            ProbeOutcome::Found("hp LaserJet 4250 w".into())
        );
    }

    #[tokio::test]
    async fn failing_probe_does_not_stop_the_others() {
        let (_dir, db) = database(Mode::Ps, "LaserJet\nPhaser\n");
        let (probes, calls) = stubs(
            Ok(Fingerprint::new("HP LaserJet 4250", "PCL,PJL,POSTSCRIPT")),
            Ok(Fingerprint::new("Phaser 6180", "")),
            timeout(),
        );

        let mut session = CapabilitySession::with_probes(safe_config(Mode::Ps), &db, probes);
        let report = session.run(|_| {}).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.probes[2].outcome, ProbeOutcome::Failed("timed out".into()));
        assert!(report.language_supported);
        assert_eq!(report.verdict, Verdict::Continue);
        assert_eq!(session.state(), SessionState::Continuing);
    }

    #[tokio::test]
    async fn safe_mode_aborts_without_evidence() {
        let (_dir, db) = database(Mode::Pjl, "LaserJet\n");
        let (probes, _) = stubs(timeout(), Ok(Fingerprint::new("Canon iR-ADV C5535", "")), timeout());

        let mut session = CapabilitySession::with_probes(safe_config(Mode::Pjl), &db, probes);
        let report = session.run(|_| {}).await;

        assert!(report.support.is_empty());
        assert!(!report.language_supported);
        assert_eq!(report.verdict, Verdict::Abort);
        assert_eq!(report.probes[1].outcome, ProbeOutcome::NoData);
        assert_eq!(session.state(), SessionState::Terminated);
    }

    #[tokio::test]
    async fn alias_alone_counts_as_support() {
        let (_dir, db) = database(Mode::Ps, "");
        let (probes, _) = stubs(
            Ok(Fingerprint::new("Unknown Model 9", "PJL,BR-Script3")),
            Ok(Fingerprint::default()),
            Ok(Fingerprint::default()),
        );

        let mut session = CapabilitySession::with_probes(safe_config(Mode::Ps), &db, probes);
        let report = session.run(|_| {}).await;

        assert_eq!(report.probes[0].outcome, ProbeOutcome::NoData);
        assert_eq!(report.support, vec![SupportSignal::LanguageAlias("BR-Script".into())]);
        assert_eq!(report.verdict, Verdict::Continue);
    }

    #[tokio::test]
    async fn unsafe_configuration_skips_everything() {
        let (_dir, db) = database(Mode::Ps, "LaserJet\n");
        let (probes, calls) = stubs(
            Ok(Fingerprint::new("LaserJet", "PS")),
            Ok(Fingerprint::default()),
            Ok(Fingerprint::default()),
        );

        let config = SessionConfig::new("printer.test", Mode::Ps);
        let mut session = CapabilitySession::with_probes(config, &db, probes);
        let report = session.run(|_| {}).await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(report.probes.is_empty());
        assert_eq!(report.verdict, Verdict::Skipped);
        assert_eq!(session.state(), SessionState::Initialized);
    }

    #[tokio::test]
    async fn feedback_arrives_in_probe_order() {
        let (_dir, db) = database(Mode::Pcl, "LaserJet\n");
        let (probes, _) = stubs(timeout(), Ok(Fingerprint::new("LaserJet M402", "")), timeout());

        let mut seen = Vec::new();
        let mut session = CapabilitySession::with_probes(safe_config(Mode::Pcl), &db, probes);
        session.run(|report| seen.push(report.protocol)).await;

        assert_eq!(seen, vec![Protocol::Ipp, Protocol::Http, Protocol::Snmp]);
    }

    #[tokio::test]
    async fn sessions_do_not_share_support() {
        let (_dir, db) = database(Mode::Pcl, "LaserJet\n");

        let (probes, _) = stubs(Ok(Fingerprint::new("LaserJet", "PCL")), timeout(), timeout());
        let mut first = CapabilitySession::with_probes(safe_config(Mode::Pcl), &db, probes);
        first.run(|_| {}).await;

        let (probes, _) = stubs(timeout(), timeout(), timeout());
        let mut second = CapabilitySession::with_probes(safe_config(Mode::Pcl), &db, probes);
        let report = second.run(|_| {}).await;

        assert!(!first.support().is_empty());
        assert!(report.support.is_empty());
        assert_eq!(report.verdict, Verdict::Abort);
    }

    #[tokio::test]
    async fn network_probes_run_against_local_fixtures() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("pjl.dat"), "LaserJet 4250\n").expect("write db");

        let (ipp_port, _) = serve_once(http_ok(
            "application/ipp",
            b"\x01\x01\x00\x00MDL:hp LaserJet 4250;CMD:PCL,PJL,POSTSCRIPT;\x03",
        ))
        .await;
        let (http_port, _) = serve_once(http_ok(
            "text/html",
            b"<html><title>hp LaserJet 4250 / 192.168.1.20</title></html>",
        ))
        .await;
        let silent = std::net::UdpSocket::bind("127.0.0.1:0").expect("bind");

        let mut config = SessionConfig::new("127.0.0.1", Mode::Pjl);
        config.safe = true;
        config.timeout = Duration::from_millis(500);
        config.db_dir = dir.path().to_path_buf();
        config.ports.ipp = ipp_port;
        config.ports.http = http_port;
        config.ports.snmp = silent.local_addr().expect("addr").port();

        let mut session = CapabilitySession::new(config);
        let report = session.run(|_| {}).await;

        assert_eq!(report.probes[0].outcome, ProbeOutcome::Found("hp LaserJet 4250".into()));
        assert_eq!(
            report.probes[1].outcome,
            ProbeOutcome::Found("hp LaserJet 4250 / 192.168.1.20".into())
        );
        assert!(matches!(report.probes[2].outcome, ProbeOutcome::Failed(_)));
        assert!(report.support.contains(&SupportSignal::LanguageAlias("PJL".into())));
        assert_eq!(report.verdict, Verdict::Continue);
    }
}
