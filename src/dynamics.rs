//! Update rules of attention, information and opinion.
//!
//! A tick first applies the interaction between the active agent and one of
//! its neighbors, then updates every agent independently: attention decays
//! and opinion takes one Euler-Maruyama step in a double-well potential
//! whose depth is set by attention and whose tilt is set by information.

use crate::config::ModelParams;
use crate::error::{Error, Result};
use crate::population::Population;
use rand::prelude::*;
use rand_distr::Normal;

/// Let the active agent interact with a random neighbor.
///
/// Both agents gain attention and the neighbor moves its information
/// towards the active agent's. Returns the chosen neighbor, or `None` for
/// an isolated agent, which does not interact.
pub fn interact<R: Rng + ?Sized>(
    pop: &mut Population,
    active: usize,
    par: &ModelParams,
    rng: &mut R,
) -> Result<Option<usize>> {
    let Some(&chosen) = pop.agents()[active].neighbors().choose(rng) else {
        return Ok(None);
    };

    let info_noise = Normal::new(0.0, par.sd_info)
        .map_err(|err| Error::config(format!("invalid information noise: {err}")))?;

    let agents = pop.agents_mut();
    for idx in [active, chosen] {
        let attention = agents[idx].attention;
        agents[idx].attention = attention + boost(par, attention);
    }

    let src = &agents[active];
    let dst = &agents[chosen];
    let r = persuasion_weight(par, src.attention, dst.attention);
    let information = r * dst.information + (1.0 - r) * src.information + info_noise.sample(rng);
    agents[chosen].information = information;

    Ok(Some(chosen))
}

/// Apply attention decay and integrate the opinion of every agent.
///
/// # Errors
/// Returns [`Error::Arithmetic`] if an opinion stops being finite, which
/// happens when `dt` is too large for the explicit step to stay stable.
pub fn integrate<R: Rng + ?Sized>(pop: &mut Population, par: &ModelParams, rng: &mut R) -> Result<()> {
    let opinion_noise = Normal::new(0.0, par.sd_opinion)
        .map_err(|err| Error::config(format!("invalid opinion noise: {err}")))?;

    // Decay rate is scaled so the total attention does not depend on population size.
    let decay = 2.0 * par.attention_delta / pop.len() as f64;

    for agt in pop.agents_mut() {
        agt.attention -= decay * agt.attention;

        let drift = -(agt.opinion.powi(3) - (agt.attention - par.a_min) * agt.opinion - agt.information);
        agt.opinion += drift * par.dt + opinion_noise.sample(rng) * par.dt;
        if !agt.opinion.is_finite() {
            return Err(Error::Arithmetic(format!(
                "opinion of agent {} diverged (dt = {})",
                agt.id(),
                par.dt
            )));
        }
    }

    Ok(())
}

/// Attention gained from an interaction, saturating at `2`.
fn boost(par: &ModelParams, attention: f64) -> f64 {
    par.attention_delta * (2.0 - attention)
}

/// Weight the receiver keeps on its own information.
///
/// Logistic in the attention difference `receiver - source`, ranging from
/// `r_min` to `1`. A source more attentive than the receiver lowers the
/// weight and so moves the receiver further towards its own information.
fn persuasion_weight(par: &ModelParams, src_attention: f64, dst_attention: f64) -> f64 {
    let expo = (-par.persuasion * (dst_attention - src_attention)).exp();
    par.r_min + (1.0 - par.r_min) / (1.0 + expo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha12Rng;

    fn quiet_params() -> ModelParams {
        ModelParams {
            sd_opinion: 0.0,
            sd_info: 0.0,
            ..ModelParams::default()
        }
    }

    fn rng() -> ChaCha12Rng {
        ChaCha12Rng::seed_from_u64(9)
    }

    #[test]
    fn interaction_updates_pair_only() {
        let par = quiet_params();
        let mut pop = Population::from_agents(vec![
            (0.2, 0.5, 0.8, vec![1]),
            (-0.4, 0.3, -0.6, vec![0, 2]),
            (0.9, 0.7, 0.1, vec![1]),
        ]);

        let chosen = interact(&mut pop, 0, &par, &mut rng()).unwrap();
        assert_eq!(chosen, Some(1));

        let att_src: f64 = 0.5 + 0.1 * (2.0 - 0.5);
        let att_dst: f64 = 0.3 + 0.1 * (2.0 - 0.3);
        let r = 0.05 + 0.95 / (1.0 + (-(att_dst - att_src)).exp());
        let info_dst = r * -0.6 + (1.0 - r) * 0.8;

        let agents = pop.agents();
        assert!((agents[0].attention - att_src).abs() < 1e-12);
        assert!((agents[1].attention - att_dst).abs() < 1e-12);
        assert!((agents[1].information - info_dst).abs() < 1e-12);
        assert_eq!(agents[0].information, 0.8);
        assert_eq!(agents[0].opinion, 0.2);
        assert_eq!(agents[1].opinion, -0.4);
        assert_eq!(
            (agents[2].opinion, agents[2].attention, agents[2].information),
            (0.9, 0.7, 0.1)
        );
    }

    #[test]
    fn isolated_agent_does_not_interact() {
        let par = quiet_params();
        let mut pop = Population::from_agents(vec![(0.2, 0.5, 0.8, vec![]), (0.1, 0.4, 0.3, vec![])]);
        let before = pop.clone();

        let chosen = interact(&mut pop, 0, &par, &mut rng()).unwrap();
        assert_eq!(chosen, None);
        assert_eq!(pop, before);
    }

    #[test]
    fn self_loop_boosts_twice() {
        let par = quiet_params();
        let mut pop = Population::from_agents(vec![(0.0, 0.5, 0.4, vec![0])]);

        interact(&mut pop, 0, &par, &mut rng()).unwrap();

        let once = 0.5 + 0.1 * (2.0 - 0.5);
        let twice = once + 0.1 * (2.0 - once);
        let agt = &pop.agents()[0];
        assert!((agt.attention - twice).abs() < 1e-12);
        assert!((agt.information - 0.4).abs() < 1e-12);
    }

    #[test]
    fn persuasion_weight_limits() {
        let par = ModelParams {
            persuasion: 50.0,
            ..ModelParams::default()
        };
        // Equal attention splits the weight evenly above `r_min`.
        let even = persuasion_weight(&par, 0.5, 0.5);
        assert!((even - (0.05 + 0.95 / 2.0)).abs() < 1e-12);
        assert!((persuasion_weight(&par, 2.0, 0.0) - 0.05).abs() < 1e-12);
        assert!((persuasion_weight(&par, 0.0, 2.0) - 1.0).abs() < 1e-12);
        assert!(persuasion_weight(&par, 0.6, 0.5) < even);
    }

    #[test]
    fn attentive_source_persuades_receiver() {
        let par = ModelParams {
            persuasion: 10.0,
            attention_delta: 0.0,
            ..quiet_params()
        };
        let mut pop = Population::from_agents(vec![(0.0, 1.9, 1.0, vec![1]), (0.0, 0.0, -1.0, vec![0])]);

        interact(&mut pop, 0, &par, &mut rng()).unwrap();

        let r = 0.05 + 0.95 / (1.0 + 19.0f64.exp());
        let info = r * -1.0 + (1.0 - r) * 1.0;
        let received = pop.agents()[1].information;
        assert!((received - info).abs() < 1e-12);
        assert!(received > 0.89);
    }

    #[test]
    fn decay_and_drift() {
        let par = quiet_params();
        let mut pop = Population::from_agents(vec![(0.5, 1.0, 0.2, vec![]), (-1.0, 0.0, 0.0, vec![])]);

        integrate(&mut pop, &par, &mut rng()).unwrap();

        let att = 1.0 - 2.0 * (0.1 / 2.0) * 1.0;
        let opinion = 0.5 - (0.5f64.powi(3) - (att + 0.5) * 0.5 - 0.2) * 0.1;
        let agents = pop.agents();
        assert!((agents[0].attention - att).abs() < 1e-12);
        assert!((agents[0].opinion - opinion).abs() < 1e-12);
        assert_eq!(agents[0].information, 0.2);

        let opinion = -1.0 - ((-1.0f64).powi(3) - 0.5 * -1.0) * 0.1;
        assert_eq!(agents[1].attention, 0.0);
        assert!((agents[1].opinion - opinion).abs() < 1e-12);
    }

    #[test]
    fn unstable_time_step_is_an_arithmetic_error() {
        let par = ModelParams {
            dt: 1.0,
            ..quiet_params()
        };
        let mut pop = Population::from_agents(vec![(3.0, 0.0, 0.0, vec![])]);
        let mut rng = rng();

        let err = (0..20)
            .find_map(|_| integrate(&mut pop, &par, &mut rng).err())
            .unwrap();
        assert!(matches!(err, Error::Arithmetic(msg) if msg.contains("agent 0")));
    }

    #[test]
    fn zero_time_step_freezes_opinion() {
        let par = ModelParams {
            dt: 0.0,
            sd_opinion: 0.0,
            ..ModelParams::default()
        };
        let mut pop = Population::from_agents(vec![(0.7, 0.4, 1.0, vec![1]), (-0.3, 0.9, -1.0, vec![0])]);
        let mut rng = rng();

        for _ in 0..50 {
            interact(&mut pop, 0, &par, &mut rng).unwrap();
            integrate(&mut pop, &par, &mut rng).unwrap();
        }

        assert_eq!(pop.agents()[0].opinion, 0.7);
        assert_eq!(pop.agents()[1].opinion, -0.3);
    }

    #[test]
    fn opinion_settles_in_a_well_above_threshold() {
        // With attention well above `a_min` the potential has minima at
        // +/- sqrt(attention - a_min); without information the opinion
        // relaxes into the well on its side.
        let par = ModelParams {
            attention_delta: 0.0,
            ..quiet_params()
        };
        let mut pop = Population::from_agents(vec![(0.1, 1.5, 0.0, vec![]), (-0.1, 1.5, 0.0, vec![])]);
        let mut rng = rng();
        for _ in 0..2000 {
            integrate(&mut pop, &par, &mut rng).unwrap();
        }

        let well = (1.5f64 + 0.5).sqrt();
        assert!((pop.agents()[0].opinion - well).abs() < 1e-6);
        assert!((pop.agents()[1].opinion + well).abs() < 1e-6);
    }
}
