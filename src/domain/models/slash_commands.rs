#[cfg(test)]
#[path = "slash_commands_test.rs"]
mod tests;

pub struct SlashCommand {
    command: String,
    pub args: Vec<String>,
}

impl SlashCommand {
    pub fn parse(text: &str) -> Option<SlashCommand> {
        let mut args = text
            .split_whitespace()
            .map(|e| return e.to_string())
            .collect::<Vec<String>>();
        if args.is_empty() {
            return None;
        }

        let prefix = args.remove(0);
        let cmd = SlashCommand {
            command: prefix,
            args,
        };
        if cmd.is_quit()
            || cmd.is_select()
            || cmd.is_sources()
            || cmd.is_selection()
            || cmd.is_stop()
            || cmd.is_clear()
            || cmd.is_help()
        {
            return Some(cmd);
        }

        return None;
    }

    pub fn is_quit(&self) -> bool {
        return ["/q", "/quit", "/exit"].contains(&self.command.as_str());
    }

    pub fn is_select(&self) -> bool {
        return ["/s", "/select"].contains(&self.command.as_str());
    }

    pub fn is_sources(&self) -> bool {
        return ["/ls", "/sources"].contains(&self.command.as_str());
    }

    pub fn is_selection(&self) -> bool {
        return ["/selection"].contains(&self.command.as_str());
    }

    pub fn is_stop(&self) -> bool {
        return ["/stop"].contains(&self.command.as_str());
    }

    pub fn is_clear(&self) -> bool {
        return ["/clear"].contains(&self.command.as_str());
    }

    pub fn is_help(&self) -> bool {
        return ["/h", "/help"].contains(&self.command.as_str());
    }

    /// Arguments joined back into free text, used for search queries.
    pub fn query(&self) -> String {
        return self.args.join(" ");
    }

    /// Arguments as ids, accepting both space and comma separators.
    pub fn ids(&self) -> Vec<String> {
        return self
            .args
            .iter()
            .flat_map(|e| return e.split(','))
            .filter(|e| return !e.is_empty())
            .map(|e| return e.to_string())
            .collect();
    }
}
