//! Example: Random agent on a slippery grid world

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use gridworld_rl_core::{ActionSpace, Environment, TrackedEnvironment};
use gridworld_rl_env::{GridAction, GridWorld, GridWorldConfig, TextHeatmap, TimeLimit};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 5x5 grid with a wall segment and a goal in the top-right corner
    let config = GridWorldConfig::new(5)
        .with_transition_probability(0.8)
        .with_terminal_states([(4, 4)])
        .with_barrier_states([(2, 1), (2, 2), (2, 3)])
        .with_initial_state((0, 0))
        .with_seed(7);
    let world = GridWorld::new(config)?;
    println!("{world}");

    let action_space = world.action_space().clone();
    let env = TimeLimit::new(world, 200);
    let mut env = TrackedEnvironment::new(env);
    let mut rng = StdRng::seed_from_u64(42);

    // Run episodes
    let num_episodes = 10;
    let mut episode_rewards = Vec::new();

    for episode in 0..num_episodes {
        env.reset()?;
        let mut total_reward = 0.0;
        let mut steps = 0;

        loop {
            let action = action_space.sample(&mut rng);
            let step = env.step(action)?;
            total_reward += step.reward.0;
            steps += 1;

            if step.done || step.truncated {
                break;
            }
        }

        episode_rewards.push(total_reward);
        println!(
            "Episode {}: Total Reward = {:.2}, Steps = {}",
            episode + 1,
            total_reward,
            steps
        );
    }

    let avg_reward: f64 = episode_rewards.iter().sum::<f64>() / f64::from(num_episodes);
    println!("\nAverage Reward over {num_episodes} episodes: {avg_reward:.2}");

    // Roll out a hand-written policy around the wall
    let world = &mut env.env.env;
    let pi: Vec<GridAction> = (0..world.n_states())
        .map(|s| match world.decode_state(s) {
            Ok(c) if c.y < 4 && c.x < 2 => GridAction::Up,
            Ok(c) if c.y < 4 && c.x == 4 => GridAction::Up,
            _ => GridAction::Right,
        })
        .collect();
    let mut sink = TextHeatmap::new();
    world.plot_trajectory(&mut sink, &pi, None)?;
    println!("\n{}", sink.rendered());

    env.close()?;

    Ok(())
}
