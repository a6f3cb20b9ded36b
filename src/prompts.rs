use std::io::{self, BufRead, Write};
use crate::budget::FeeParameters;
use crate::goal_seek::{SearchRequest, SeekSettings};
use crate::utils::{ad_label, parse_decimal};

/// Console prompts that repeat until the answer parses and passes its check
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask until `parse` returns a value, printing `complaint` after every rejected answer
    fn ask<T>(&mut self, prompt: &str, complaint: &str, parse: impl Fn(&str) -> Option<T>) -> io::Result<T> {
        loop {
            write!(self.output, "{}", prompt)?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input ended before a valid value was entered",
                ));
            }
            if let Some(value) = parse(line.trim()) {
                return Ok(value);
            }
            writeln!(self.output, "{}", complaint)?;
        }
    }

    pub fn positive_integer(&mut self, prompt: &str) -> io::Result<usize> {
        self.ask(prompt, "Invalid input. Please enter a positive integer.", |text| {
            text.parse::<usize>().ok().filter(|&n| n > 0)
        })
    }

    pub fn non_negative_amount(&mut self, prompt: &str) -> io::Result<f64> {
        self.ask(prompt, "Invalid input. Please enter a non-negative number.", |text| {
            parse_decimal(text).filter(|v| v.is_finite() && *v >= 0.0)
        })
    }

    /// A fee rate given as a decimal fraction, e.g. 0.10 for 10%
    pub fn rate(&mut self, prompt: &str) -> io::Result<f64> {
        self.ask(prompt, "Invalid input. Please enter a decimal number between 0 and 1.", |text| {
            parse_decimal(text).filter(|v| (0.0..=1.0).contains(v))
        })
    }

    /// Ad number 1..=ad_count, returned as a 0-based index
    pub fn ad_index(&mut self, ad_count: usize) -> io::Result<usize> {
        let prompt = format!("Enter the ad number (1 to {}) you want to optimize: ", ad_count);
        let complaint = format!("Invalid input. Please enter a number between 1 and {}.", ad_count);
        self.ask(&prompt, &complaint, |text| {
            text.parse::<usize>().ok().filter(|n| (1..=ad_count).contains(n)).map(|n| n - 1)
        })
    }

    /// Walk the user through every input of a goal seek
    pub fn collect_request(&mut self, settings: SeekSettings) -> io::Result<SearchRequest> {
        let ad_count = self.positive_integer("Enter the number of ads: ")?;

        let mut spends = Vec::with_capacity(ad_count);
        for index in 0..ad_count {
            spends.push(self.non_negative_amount(&format!("Enter the budget for ad {}: ", ad_label(index)))?);
        }

        let agency_fee_rate = self.rate("Enter the agency fee percentage (as a decimal, e.g., 0.10 for 10%): ")?;
        let third_party_fee_rate =
            self.rate("Enter the third-party tool fee percentage (as a decimal, e.g., 0.05 for 5%): ")?;
        let fixed_cost = self.non_negative_amount("Enter the fixed cost for agency hours: ")?;
        let approved_ceiling = self.non_negative_amount("Enter the approved total campaign budget: ")?;
        let target_index = self.ad_index(ad_count)?;

        Ok(SearchRequest::with_settings(
            spends,
            target_index,
            approved_ceiling,
            FeeParameters::new(agency_fee_rate, third_party_fee_rate, fixed_cost),
            settings,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompter(script: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(script.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_positive_integer_retries_until_valid() {
        let mut p = prompter("zero\n0\n-2\n3\n");
        assert_eq!(p.positive_integer("Ads: ").unwrap(), 3);
        let printed = String::from_utf8(p.output).unwrap();
        assert_eq!(printed.matches("Invalid input. Please enter a positive integer.").count(), 3);
        assert_eq!(printed.matches("Ads: ").count(), 4);
    }

    #[test]
    fn test_amount_rejects_negative_and_non_finite() {
        let mut p = prompter("-1\nNaN\ninf\n12,5\n");
        assert_eq!(p.non_negative_amount("Budget: ").unwrap(), 12.5);
    }

    #[test]
    fn test_amount_with_thousands_separator_is_asked_again() {
        let mut p = prompter("1,000\n1.000,50\n1000\n");
        assert_eq!(p.non_negative_amount("Budget: ").unwrap(), 1000.0);
        let printed = String::from_utf8(p.output).unwrap();
        assert_eq!(printed.matches("Invalid input. Please enter a non-negative number.").count(), 2);
    }

    #[test]
    fn test_rate_must_be_a_fraction() {
        let mut p = prompter("10\n1.01\n0,10\n");
        assert_eq!(p.rate("Rate: ").unwrap(), 0.10);
    }

    #[test]
    fn test_ad_number_becomes_zero_based() {
        let mut p = prompter("0\n5\n4\n");
        assert_eq!(p.ad_index(4).unwrap(), 3);
        let printed = String::from_utf8(p.output).unwrap();
        assert!(printed.contains("Invalid input. Please enter a number between 1 and 4."));
    }

    #[test]
    fn test_closed_input_is_an_error() {
        let mut p = prompter("abc\n");
        let err = p.positive_integer("Ads: ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_collect_full_request() {
        let script = "4\n500\n1000\n1500\n2000\n0.10\n0.05\n300\n5000\n3\n";
        let mut p = prompter(script);
        let request = p.collect_request(SeekSettings::default()).unwrap();

        assert_eq!(request.spends, vec![500.0, 1000.0, 1500.0, 2000.0]);
        assert_eq!(request.target_index, 2);
        assert_eq!(request.approved_ceiling, 5000.0);
        assert_eq!(request.fees, FeeParameters::new(0.10, 0.05, 300.0));
        assert_eq!(request.tolerance, 0.01);
        assert_eq!(request.max_iterations, 1000);

        let printed = String::from_utf8(p.output).unwrap();
        assert!(printed.contains("Enter the budget for ad X4: "));
    }
}
