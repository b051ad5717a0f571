//! Interactive confirmation prompts.
//!
//! `confirm` is a plain yes/no question; `confirm_safe` makes the
//! operator retype a random 4-digit number first, for actions that
//! delete things.

use std::io::{self, Write};

use rand::Rng;

/// Ask a yes/no question. `default` is the answer taken on a bare Enter;
/// `None` keeps asking until the operator answers.
pub fn confirm(question: &str, default: Option<bool>) -> io::Result<bool> {
    let hint = match default {
        Some(true) => " [Y/n] ",
        Some(false) => " [y/N] ",
        None => " [y/n] ",
    };

    loop {
        print!("{}{}", question, hint);
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            // EOF counts as declining
            return Ok(false);
        }

        match line.trim().to_lowercase().as_str() {
            "" => {
                if let Some(answer) = default {
                    return Ok(answer);
                }
            }
            "y" | "ye" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => {}
        }
        println!("Please respond with 'yes' or 'no' (or 'y' or 'n').");
    }
}

/// Print a random 4-digit number; the operator must type it back.
pub fn confirm_safe(question: &str) -> io::Result<bool> {
    let check: u32 = rand::thread_rng().gen_range(0..10000);
    let check = format!("{:04}", check);

    print!(
        "{}\nType the following number to confirm: {}\n> ",
        question, check
    );
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(false);
    }
    Ok(line.trim() == check)
}
