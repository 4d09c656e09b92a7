use std::io::Write;

/// Ask the user interactively for a boolean value in the terminal (entered as y/n). In case of an
/// error, the error is printed and the user is queried again and again with same prompt until the
/// entered value is parsed successfully.
pub fn query_user_bool(prompt: &str, default: Option<bool>) -> bool {
    let value_help = match default {
        Some(true) => "Y/n",
        Some(false) => "y/N",
        None => "y/n",
    };
    loop {
        println!("{} [{}]", prompt, value_help);
        print!("> ");
        if let Err(e) = std::io::stdout().flush() {
            println!("Error: {}", e);
        }
        let mut user_input = String::new();
        if let Err(e) = std::io::stdin().read_line(&mut user_input) {
            println!("Error: {}", e);
            continue;
        }
        match user_input.trim().to_lowercase().as_str() {
            "y" => return true,
            "n" => return false,
            "" => match default {
                None => {}
                Some(default) => return default,
            },
            _ => {}
        }
        println!("Error: unknown option. Please enter 'y' or 'n'.");
    }
}

/// Ask for confirmation of a deletion, unless it has been confirmed on the command line already
pub fn confirm_deletion(what: &str, confirmed: bool) -> bool {
    confirmed || query_user_bool(&format!("Really delete {}?", what), Some(false))
}
