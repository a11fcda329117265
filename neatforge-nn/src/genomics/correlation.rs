use crate::networks::{Connection, Network};

/// One of the two genomes being aligned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parent {
    First,
    Second,
}

/// A position in the alignment of two genomes' genes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment<'a> {
    /// Both genomes have a gene with this innovation number.
    Matching(&'a Connection, &'a Connection),
    /// A gene of one genome, within the other
    /// genome's innovation range but absent from it.
    Disjoint(Parent, &'a Connection),
    /// A gene of one genome, past the end of
    /// the other genome's innovation range.
    Excess(Parent, &'a Connection),
}

impl<'a> Alignment<'a> {
    /// The aligned gene contributed by `parent`, if any.
    pub fn gene(&self, parent: Parent) -> Option<&'a Connection> {
        match *self {
            Alignment::Matching(first, second) => Some(match parent {
                Parent::First => first,
                Parent::Second => second,
            }),
            Alignment::Disjoint(owner, gene) | Alignment::Excess(owner, gene) => {
                (owner == parent).then(|| gene)
            }
        }
    }
}

/// The alignment of two genomes' genes by innovation number,
/// in increasing innovation order.
#[derive(Clone, Debug)]
pub struct Correlation<'a> {
    pub alignments: Vec<Alignment<'a>>,
    pub matching: usize,
    pub disjoint: usize,
    pub excess: usize,
    /// Sum of the absolute weight differences of matching genes.
    pub weight_difference: f64,
}

impl<'a> Correlation<'a> {
    /// Aligns the connections of `first` and `second`.
    ///
    /// # Examples
    /// ```
    /// use neatforge_nn::genomics::{Alignment, Correlation, Parent};
    /// use neatforge_nn::networks::{ActivationFunction, Connection, Network, NeuronType};
    ///
    /// let mut first = Network::new();
    /// first.add_neuron(1, NeuronType::Input, ActivationFunction::identity()).unwrap();
    /// first.add_neuron(2, NeuronType::Output, ActivationFunction::sigmoid()).unwrap();
    /// let mut second = first.clone();
    /// first.add_connection(Connection::new(0, 1, 2, 1.0)).unwrap();
    /// first.add_connection(Connection::new(3, 2, 2, 1.0)).unwrap();
    /// second.add_connection(Connection::new(0, 1, 2, 0.5)).unwrap();
    ///
    /// let correlation = Correlation::new(&first, &second);
    /// assert_eq!(correlation.matching, 1);
    /// assert_eq!(correlation.excess, 1);
    /// assert_eq!(correlation.mean_weight_difference(), 0.5);
    /// assert!(matches!(correlation.alignments[1], Alignment::Excess(Parent::First, _)));
    /// ```
    pub fn new(first: &'a Network, second: &'a Network) -> Correlation<'a> {
        let first_end = first.max_innovation();
        let second_end = second.max_innovation();
        let mut first_genes = first.connections().peekable();
        let mut second_genes = second.connections().peekable();

        let mut correlation = Correlation {
            alignments: Vec::with_capacity(first.connection_count().max(second.connection_count())),
            matching: 0,
            disjoint: 0,
            excess: 0,
            weight_difference: 0.0,
        };

        // Excess genes lie past the end of
        // the other genome's innovation range.
        let unmatched = |parent: Parent, gene: &'a Connection, other_end: Option<usize>| {
            if other_end.map_or(true, |end| gene.innovation() > end) {
                Alignment::Excess(parent, gene)
            } else {
                Alignment::Disjoint(parent, gene)
            }
        };

        loop {
            let alignment = match (first_genes.peek().copied(), second_genes.peek().copied()) {
                (None, None) => break,
                (Some(a), Some(b)) if a.innovation() == b.innovation() => {
                    first_genes.next();
                    second_genes.next();
                    correlation.matching += 1;
                    correlation.weight_difference += (a.weight() - b.weight()).abs();
                    Alignment::Matching(a, b)
                }
                (Some(a), Some(b)) if a.innovation() < b.innovation() => {
                    first_genes.next();
                    unmatched(Parent::First, a, second_end)
                }
                (Some(a), None) => {
                    first_genes.next();
                    unmatched(Parent::First, a, second_end)
                }
                (_, Some(b)) => {
                    second_genes.next();
                    unmatched(Parent::Second, b, first_end)
                }
            };
            match alignment {
                Alignment::Disjoint(..) => correlation.disjoint += 1,
                Alignment::Excess(..) => correlation.excess += 1,
                Alignment::Matching(..) => {}
            }
            correlation.alignments.push(alignment);
        }

        correlation
    }

    /// Mean absolute weight difference of matching
    /// genes, or 0 if there are none.
    pub fn mean_weight_difference(&self) -> f64 {
        if self.matching == 0 {
            0.0
        } else {
            self.weight_difference / self.matching as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networks::{ActivationFunction, NeuronType};

    fn network(genes: &[(usize, f64)]) -> Network {
        let mut network = Network::new();
        network
            .add_neuron(0, NeuronType::Input, ActivationFunction::identity())
            .unwrap();
        for target in 1..=10 {
            network
                .add_neuron(target, NeuronType::Hidden, ActivationFunction::sigmoid())
                .unwrap();
        }
        for (innovation, weight) in genes {
            network
                .add_connection(Connection::new(*innovation, 0, *innovation + 1, *weight))
                .unwrap();
        }
        network
    }

    #[test]
    fn three_way_merge() {
        let first = network(&[(0, 1.0), (1, 1.0), (4, 0.0), (7, 2.0), (8, 2.0)]);
        let second = network(&[(0, 0.0), (2, 1.0), (4, 0.5), (5, 1.0)]);
        let correlation = Correlation::new(&first, &second);

        let layout: Vec<_> = correlation
            .alignments
            .iter()
            .map(|a| match a {
                Alignment::Matching(a, _) => ("M", None, a.innovation()),
                Alignment::Disjoint(p, g) => ("D", Some(*p), g.innovation()),
                Alignment::Excess(p, g) => ("E", Some(*p), g.innovation()),
            })
            .collect();
        assert_eq!(
            layout,
            vec![
                ("M", None, 0),
                ("D", Some(Parent::First), 1),
                ("D", Some(Parent::Second), 2),
                ("M", None, 4),
                ("D", Some(Parent::Second), 5),
                ("E", Some(Parent::First), 7),
                ("E", Some(Parent::First), 8),
            ]
        );
        assert_eq!(correlation.matching, 2);
        assert_eq!(correlation.disjoint, 3);
        assert_eq!(correlation.excess, 2);
        assert_eq!(correlation.weight_difference, 1.5);
        assert_eq!(correlation.mean_weight_difference(), 0.75);
    }

    #[test]
    fn empty_genomes() {
        let empty = network(&[]);
        let other = network(&[(3, 1.0)]);
        let correlation = Correlation::new(&empty, &other);
        assert_eq!(correlation.excess, 1);
        assert_eq!(correlation.mean_weight_difference(), 0.0);
        assert_eq!(
            correlation.alignments[0].gene(Parent::Second).map(|g| g.innovation()),
            Some(3)
        );
        assert_eq!(correlation.alignments[0].gene(Parent::First), None);
        assert!(Correlation::new(&empty, &empty).alignments.is_empty());
    }
}
