use std::collections::BTreeSet;

/// The order in which characters settle in sequential mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumString, strum::Display)]
#[strum(ascii_case_insensitive)]
pub enum RevealOrder {
    /// Left to right
    #[default]
    #[strum(to_string = "start", serialize = "forward")]
    Forward,

    /// Right to left
    #[strum(to_string = "end", serialize = "backward")]
    Backward,

    /// Alternating outwards from the middle character
    #[strum(to_string = "center", serialize = "center-out")]
    CenterOut,
}

impl RevealOrder {
    /// Pick the next index to reveal given the already revealed ones, or `None` once every
    /// position of a `len` long string is revealed.
    pub fn next_index(self, revealed: &BTreeSet<usize>, len: usize) -> Option<usize> {
        let n = revealed.len();
        if n >= len {
            return None;
        }
        let index = match self {
            Self::Forward => n,
            Self::Backward => len - 1 - n,
            Self::CenterOut => {
                let middle = len / 2;
                let offset = n / 2;
                let candidate = if n % 2 == 0 { Some(middle + offset) } else { middle.checked_sub(offset + 1) };
                match candidate {
                    Some(index) if index < len && !revealed.contains(&index) => index,
                    _ => lowest_unrevealed(revealed, len)?,
                }
            }
        };
        Some(index)
    }

    /// The full reveal sequence for a string of the given length.
    pub fn sequence(self, len: usize) -> Vec<usize> {
        let mut revealed = BTreeSet::new();
        let mut order = Vec::with_capacity(len);
        while let Some(index) = self.next_index(&revealed, len) {
            if !revealed.insert(index) {
                break;
            }
            order.push(index);
        }
        order
    }
}

fn lowest_unrevealed(revealed: &BTreeSet<usize>, len: usize) -> Option<usize> {
    (0..len).find(|index| !revealed.contains(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case::forward(RevealOrder::Forward, 4, vec![0, 1, 2, 3])]
    #[case::backward(RevealOrder::Backward, 4, vec![3, 2, 1, 0])]
    #[case::center_odd(RevealOrder::CenterOut, 5, vec![2, 1, 3, 0, 4])]
    #[case::center_even(RevealOrder::CenterOut, 4, vec![2, 1, 3, 0])]
    #[case::center_six(RevealOrder::CenterOut, 6, vec![3, 2, 4, 1, 5, 0])]
    #[case::center_single(RevealOrder::CenterOut, 1, vec![0])]
    #[case::empty(RevealOrder::CenterOut, 0, vec![])]
    fn reveal_sequence(#[case] order: RevealOrder, #[case] len: usize, #[case] expected: Vec<usize>) {
        assert_eq!(order.sequence(len), expected);
    }

    #[test]
    fn center_out_falls_back_to_lowest_unrevealed() {
        // n = 1 on a 5 character string points at index 1, which is taken.
        let revealed = BTreeSet::from([1]);
        assert_eq!(RevealOrder::CenterOut.next_index(&revealed, 5), Some(0));
    }

    #[test]
    fn exhausted() {
        let revealed = BTreeSet::from([0, 1]);
        assert_eq!(RevealOrder::Backward.next_index(&revealed, 2), None);
    }

    #[rstest]
    #[case("start", RevealOrder::Forward)]
    #[case("Forward", RevealOrder::Forward)]
    #[case("end", RevealOrder::Backward)]
    #[case("center", RevealOrder::CenterOut)]
    #[case("center-out", RevealOrder::CenterOut)]
    fn parse(#[case] input: &str, #[case] expected: RevealOrder) {
        assert_eq!(RevealOrder::from_str(input).expect("parse failed"), expected);
    }

    #[test]
    fn unknown_name() {
        assert!(RevealOrder::from_str("diagonal").is_err());
    }
}
