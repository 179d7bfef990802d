//! Startup options and the policies derived from them.
//!
//! Command-line parsing is owned by the platform layer; this is the parsed
//! result. The derived methods encode which combinations disable the
//! graphical intro, the alternate front-end menu, and cheat-free
//! bookkeeping.

// ---------------------------------------------------------------------------
// StartupOptions
// ---------------------------------------------------------------------------

/// Parsed startup flags and config settings this core reads.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct StartupOptions {
    /// Skip the graphical intro sequence.
    pub skip_intro: bool,
    /// Developer mode. Implies skipping the intro.
    pub dev_mode: bool,
    /// Config setting: run the graphical startup at all.
    pub graphical_startup: bool,
    /// Warp straight into the given map.
    pub warp: Option<u32>,
    /// Play back the named demo recording.
    pub play_demo: Option<String>,
    /// Record a demo under the given name.
    pub record_demo: Option<String>,
    /// Play back the named demo while timing the frame rate.
    pub time_demo: Option<String>,
    /// Load the game in the given save slot at startup.
    pub load_slot: Option<u32>,
    /// Explicitly disable the alternate front-end menu.
    pub no_frontend: bool,
    /// Run as a dedicated server.
    pub dedicated_server: bool,
    /// Query servers and exit.
    pub query_mode: bool,
    /// Connect to the given server address.
    pub connect: Option<String>,
    /// Join a network game as a passive drone.
    pub drone: bool,
    /// Single-player netgame emulation.
    pub solo_net: bool,
    /// Control-testing mode (invoked by the setup tool).
    pub test_controls: bool,
    /// Running as a screensaver.
    pub screensaver: bool,
    /// Config setting: show the end-of-run text screen at exit.
    pub show_end_screen: bool,
}

impl Default for StartupOptions {
    fn default() -> Self {
        Self {
            skip_intro: false,
            dev_mode: false,
            graphical_startup: true,
            warp: None,
            play_demo: None,
            record_demo: None,
            time_demo: None,
            load_slot: None,
            no_frontend: false,
            dedicated_server: false,
            query_mode: false,
            connect: None,
            drone: false,
            solo_net: false,
            test_controls: false,
            screensaver: false,
            show_end_screen: false,
        }
    }
}

// Cheat scoping: some flags only count as cheating in single player, some
// only in multiplayer, some in both.
const CHEAT_SP: u8 = 0x01;
const CHEAT_MP: u8 = 0x02;
const CHEAT_ANY: u8 = CHEAT_SP | CHEAT_MP;

impl StartupOptions {
    /// Whether the graphical startup intro runs.
    pub fn intro_enabled(&self) -> bool {
        self.graphical_startup && !self.skip_intro && !self.dev_mode && !self.test_controls
    }

    /// Whether the alternate front-end menu runs. Several modes disable it
    /// implicitly on top of the explicit flag.
    pub fn frontend_enabled(&self) -> bool {
        !(self.no_frontend
            || self.dev_mode
            || self.warp.is_some()
            || self.play_demo.is_some()
            || self.record_demo.is_some()
            || self.time_demo.is_some()
            || self.dedicated_server
            || self.query_mode
            || self.connect.is_some()
            || self.drone
            || self.solo_net)
    }

    /// Whether startup goes straight into gameplay, skipping the
    /// intro/demo cycle entirely.
    pub fn autostart(&self) -> bool {
        self.warp.is_some()
            || self.play_demo.is_some()
            || self.record_demo.is_some()
            || self.time_demo.is_some()
            || self.load_slot.is_some()
            || self.test_controls
    }

    fn cheat_mask(&self) -> u8 {
        let mut mask = 0;
        if self.dev_mode || self.test_controls {
            mask |= CHEAT_ANY;
        }
        if self.play_demo.is_some() || self.time_demo.is_some() || self.record_demo.is_some() {
            mask |= CHEAT_ANY;
        }
        if self.warp.is_some() || self.load_slot.is_some() {
            mask |= CHEAT_SP;
        }
        mask
    }

    /// Whether cheat-free bookkeeping is suspended for this session.
    pub fn engages_cheats(&self, netgame: bool) -> bool {
        let scope = if netgame { CHEAT_MP } else { CHEAT_SP };
        self.cheat_mask() & scope != 0
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_run_the_full_presentation() {
        let opts = StartupOptions::default();
        assert!(opts.intro_enabled());
        assert!(opts.frontend_enabled());
        assert!(!opts.autostart());
        assert!(!opts.engages_cheats(false));
        assert!(!opts.engages_cheats(true));
    }

    #[test]
    fn dev_mode_implies_no_intro_and_no_frontend() {
        let opts = StartupOptions {
            dev_mode: true,
            ..Default::default()
        };
        assert!(!opts.intro_enabled());
        assert!(!opts.frontend_enabled());
        assert!(opts.engages_cheats(false));
        assert!(opts.engages_cheats(true));
    }

    #[test]
    fn graphical_startup_config_disables_intro() {
        let opts = StartupOptions {
            graphical_startup: false,
            ..Default::default()
        };
        assert!(!opts.intro_enabled());
        // The frontend is unaffected by the intro config.
        assert!(opts.frontend_enabled());
    }

    #[test]
    fn network_modes_disable_frontend() {
        for opts in [
            StartupOptions {
                dedicated_server: true,
                ..Default::default()
            },
            StartupOptions {
                query_mode: true,
                ..Default::default()
            },
            StartupOptions {
                connect: Some("10.0.0.2".into()),
                ..Default::default()
            },
            StartupOptions {
                drone: true,
                ..Default::default()
            },
        ] {
            assert!(!opts.frontend_enabled(), "{opts:?}");
        }
    }

    #[test]
    fn warp_autostarts_and_cheats_single_player_only() {
        let opts = StartupOptions {
            warp: Some(23),
            ..Default::default()
        };
        assert!(opts.autostart());
        assert!(opts.engages_cheats(false));
        assert!(!opts.engages_cheats(true));
    }

    #[test]
    fn demo_playback_cheats_everywhere() {
        let opts = StartupOptions {
            play_demo: Some("run1".into()),
            ..Default::default()
        };
        assert!(opts.autostart());
        assert!(opts.engages_cheats(false));
        assert!(opts.engages_cheats(true));
    }

    #[test]
    fn load_slot_skips_demo_cycle() {
        let opts = StartupOptions {
            load_slot: Some(3),
            ..Default::default()
        };
        assert!(opts.autostart());
        assert!(opts.engages_cheats(false));
    }
}
