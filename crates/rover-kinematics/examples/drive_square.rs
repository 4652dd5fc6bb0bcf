use rover_kinematics::*;

// Trace a square with the body-frame policy: each `left` rotates once, the
// repeated ticks only drive forward along the new heading.
fn main() {
    let step = 0.25;
    let ticks_per_side = 4;

    let mut policy = match BodyFrame::new(step, core::f64::consts::FRAC_PI_2) {
        Ok(policy) => policy,
        Err(e) => {
            eprintln!("Failed to build policy: {}", e);
            return;
        }
    };

    let mut pose = Pose::new(0.0, 0.0, 0.0);
    println!("Start: {}", pose);

    for side in 0..4 {
        let command = if side == 0 { Command::Forward } else { Command::Left };
        for tick in 0..ticks_per_side {
            if let Some(next) = policy.update(pose, command) {
                pose = next;
            }
            println!("side {} tick {}: {:<8} -> {}", side, tick, command, pose);
        }
        // Release the button so the next `left` is a fresh turn.
        policy.update(pose, Command::Stop);
    }

    println!("End:   {}", pose);
}
